//! Scoped capture of `tracing` events.
//!
//! [`capture_events`] installs a thread-local subscriber that records every
//! event, so tests can assert on diagnostics without touching the global
//! subscriber or scraping process output.

use std::{collections::BTreeMap, fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    subscriber::DefaultGuard,
};
use tracing_subscriber::{Layer, layer::Context, prelude::*};

/// One recorded event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// Event level.
    pub level: Level,
    /// Event target (usually the emitting module path).
    pub target: String,
    /// The formatted message.
    pub message: String,
    /// Structured fields other than the message, formatted with `Debug`.
    pub fields: BTreeMap<String, String>,
}

/// Shared handle to the events recorded by [`capture_events`].
#[derive(Debug, Clone, Default)]
pub struct CapturedEvents {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedEvents {
    /// Returns a snapshot of all events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// Returns the events recorded at exactly `level`.
    #[must_use]
    pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
        self.events.lock().iter().filter(|event| event.level == level).cloned().collect()
    }

    /// Returns true if an event at `level` has a message containing `needle`.
    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.events.lock().iter().any(|event| event.level == level && event.message.contains(needle))
    }

    fn push(&self, event: CapturedEvent) {
        self.events.lock().push(event);
    }
}

struct CaptureLayer {
    events: CapturedEvents,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        self.events.push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_owned(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.insert(field.name().to_owned(), value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.insert(field.name().to_owned(), format!("{value:?}"));
        }
    }
}

/// Records every event emitted on this thread until the guard is dropped.
///
/// Works across `.await` points on a current-thread runtime (the default
/// for `#[tokio::test]`); events from other threads are not captured.
///
/// # Example
///
/// ```
/// use hostprovider_test_utils::capture_events;
/// use tracing::Level;
///
/// let (_guard, events) = capture_events();
/// tracing::warn!(host = "zk1", "Spin delay interrupted");
/// assert!(events.contains(Level::WARN, "interrupted"));
/// ```
#[must_use]
pub fn capture_events() -> (DefaultGuard, CapturedEvents) {
    let events = CapturedEvents::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer { events: events.clone() });
    let guard = tracing::subscriber::set_default(subscriber);
    (guard, events)
}
