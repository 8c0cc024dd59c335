//! Shared test utilities for the hostprovider crates.
//!
//! - [`capture_events`] - Record `tracing` events on the current thread
//! - [`assert_eventually`] - Poll a condition until it's true or timeout

#![deny(unsafe_code)]

mod assertions;
pub use assertions::assert_eventually;

mod capture;
pub use capture::{CapturedEvent, CapturedEvents, capture_events};
