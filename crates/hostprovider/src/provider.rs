//! Shuffled, cyclic server address selection.
//!
//! [`StaticHostProvider`] resolves its endpoints exactly once, shuffles the
//! result, and then walks the list round-robin. When a full pass comes back
//! to the last address that produced a connection, `next` waits for the
//! caller's spin delay so a reconnect loop cannot hot-spin against a dead
//! cluster.
//!
//! ```text
//!  next()          next()          next()  (wraps to `last`: waits spin_delay)
//!    │               │               │
//!    ▼               ▼               ▼
//! ┌──────┐       ┌──────┐       ┌──────┐
//! │  0   │──────►│  1   │──────►│  2   │──┐
//! └──────┘       └──────┘       └──────┘  │
//!    ▲                                    │
//!    └────────────────────────────────────┘
//! ```

use std::{fmt, net::SocketAddr, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use snafu::ensure;
use tokio_util::sync::CancellationToken;

use crate::{
    endpoint::{Endpoint, Host, ResolvedAddress},
    error::{InvalidArgumentSnafu, ResolverError, Result},
    resolver::{HostResolver, SystemResolver},
};

/// Source of server addresses for a reconnecting client.
///
/// The connection layer calls [`next`](Self::next) to learn which address to
/// dial and [`on_connected`](Self::on_connected) once a dial succeeds.
pub trait HostProvider: fmt::Debug + Send + Sync {
    /// Returns the number of addresses the provider cycles through.
    fn size(&self) -> usize;

    /// Returns the next address to try, possibly after waiting `spin_delay`.
    fn next(&self, spin_delay: Duration) -> BoxFuture<'_, ResolvedAddress>;

    /// Records that the most recently returned address produced a connection.
    fn on_connected(&self);
}

/// Position of the cycle.
///
/// `None` plays the role of "no element yet" for both cursors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    /// Index returned by the most recent `next`.
    current: Option<usize>,
    /// Index that was current at the most recent `on_connected`.
    last: Option<usize>,
}

impl Cursor {
    /// Index the next advance will land on.
    fn peek(&self, len: usize) -> usize {
        match self.current {
            Some(index) if index + 1 < len => index + 1,
            _ => 0,
        }
    }

    /// Returns true if the next advance comes back around to `last`.
    fn must_spin(&self, len: usize) -> bool {
        self.last == Some(self.peek(len))
    }

    /// Moves to the next index.
    fn advance(&mut self, len: usize) -> usize {
        let current = self.peek(len);
        self.current = Some(current);
        if self.last.is_none() {
            // No connection has been made yet, so there is nothing to spin around.
            self.last = Some(0);
        }
        current
    }

    fn connected(&mut self) {
        self.last = self.current;
    }
}

fn system_resolver() -> Arc<dyn HostResolver> {
    Arc::new(SystemResolver)
}

/// A host provider over a fixed, resolve-once address list.
///
/// # Thread Safety
///
/// The cursor is guarded by a mutex, so `next` and `on_connected` may be
/// called from several tasks without breaking the cyclic order. The lock is
/// never held while waiting out a spin delay.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use hostprovider::{ConnectString, StaticHostProvider};
///
/// # async fn example() -> hostprovider::Result<()> {
/// let servers = ConnectString::parse("zk1:2181,zk2:2181,zk3:2181")?;
/// let provider = StaticHostProvider::from_endpoints(servers.into_endpoints()).await?;
///
/// let target = provider.next(Duration::from_secs(1)).await;
/// // dial `target.socket_addr()`, and on success:
/// provider.on_connected();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StaticHostProvider {
    /// Resolved addresses, shuffled once at construction.
    addresses: Vec<ResolvedAddress>,

    /// Cycle position.
    cursor: Mutex<Cursor>,

    /// Shutdown signal; once fired, [`next`](Self::next) stops waiting.
    cancellation: CancellationToken,
}

#[bon::bon]
impl StaticHostProvider {
    /// Resolves `endpoints` and builds a provider over every address found.
    ///
    /// Literal endpoints are used as-is; symbolic ones are expanded to all
    /// of their addresses through `resolver`. An endpoint that fails to
    /// resolve is logged and skipped.
    ///
    /// * `resolver` - defaults to [`SystemResolver`]
    /// * `seed` - makes the shuffle deterministic; thread-local entropy otherwise
    /// * `cancellation` - shutdown signal that ends all spin delays; never
    ///   cancelled by default
    ///
    /// # Errors
    ///
    /// Returns `HostProviderError::InvalidArgument` if no endpoint produced
    /// an address, including when `endpoints` is empty.
    #[builder]
    pub async fn new(
        endpoints: Vec<Endpoint>,
        #[builder(default = system_resolver())] resolver: Arc<dyn HostResolver>,
        seed: Option<u64>,
        #[builder(default)] cancellation: CancellationToken,
    ) -> Result<Self> {
        let mut addresses = Vec::with_capacity(endpoints.len());

        for endpoint in &endpoints {
            match expand(endpoint, resolver.as_ref()).await {
                Ok(resolved) => addresses.extend(resolved),
                Err(error) => {
                    tracing::error!(
                        endpoint = %endpoint,
                        error = %error,
                        "Unable to resolve server address"
                    );
                },
            }
        }

        ensure!(
            !addresses.is_empty(),
            InvalidArgumentSnafu { message: "A HostProvider may not be empty!" }
        );

        match seed {
            Some(seed) => addresses.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => addresses.shuffle(&mut rand::rng()),
        }

        tracing::debug!(
            endpoints = endpoints.len(),
            addresses = addresses.len(),
            "Resolved server addresses"
        );

        Ok(Self { addresses, cursor: Mutex::new(Cursor::default()), cancellation })
    }

    /// Builds a provider with the system resolver and an unseeded shuffle.
    ///
    /// # Errors
    ///
    /// Returns `HostProviderError::InvalidArgument` if no endpoint resolves.
    pub async fn from_endpoints(endpoints: impl IntoIterator<Item = Endpoint>) -> Result<Self> {
        Self::builder().endpoints(endpoints.into_iter().collect()).build().await
    }

    /// Returns the number of resolved addresses.
    #[must_use]
    pub fn size(&self) -> usize {
        self.addresses.len()
    }

    /// Returns the addresses in cycle order.
    #[must_use]
    pub fn addresses(&self) -> &[ResolvedAddress] {
        &self.addresses
    }

    /// Returns true once the provider's cancellation token has fired.
    ///
    /// The provider token is a shutdown signal: after it fires, `next` no
    /// longer waits out spin delays, so a reconnect loop should stop. Use
    /// [`next_with_cancellation`](Self::next_with_cancellation) to cut a
    /// single wait short.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns the next address in the cycle.
    ///
    /// If the cycle has come back around to the address of the last
    /// successful connection and `spin_delay` is non-zero, waits for
    /// `spin_delay` first. The very first call never waits. Cancelling the
    /// provider's token cuts the wait short; the same address is returned.
    ///
    /// # Cancel Safety
    ///
    /// The cursor only moves once the wait is over, so dropping the future
    /// mid-wait leaves the address to be returned by the following call.
    pub async fn next(&self, spin_delay: Duration) -> ResolvedAddress {
        self.next_with_cancellation(spin_delay, &self.cancellation).await
    }

    /// Like [`next`](Self::next), but the wait races `cancellation` instead
    /// of the provider's own token.
    pub async fn next_with_cancellation(
        &self,
        spin_delay: Duration,
        cancellation: &CancellationToken,
    ) -> ResolvedAddress {
        let len = self.addresses.len();
        let pending = {
            let mut cursor = self.cursor.lock();
            if spin_delay.is_zero() || !cursor.must_spin(len) {
                return self.addresses[cursor.advance(len)].clone();
            }
            cursor.peek(len)
        };

        let address = &self.addresses[pending];
        tracing::debug!(
            address = %address,
            spin_delay_ms = spin_delay.as_millis() as u64,
            "Tried every server, pausing before retrying"
        );
        tokio::select! {
            biased;
            () = cancellation.cancelled() => {
                tracing::warn!(
                    address = %address,
                    spin_delay_ms = spin_delay.as_millis() as u64,
                    "Spin delay interrupted"
                );
            },
            () = tokio::time::sleep(spin_delay) => {},
        }

        let index = self.cursor.lock().advance(len);
        self.addresses[index].clone()
    }

    /// Records that the address returned by the latest `next` is connected.
    pub fn on_connected(&self) {
        self.cursor.lock().connected();
    }
}

impl HostProvider for StaticHostProvider {
    fn size(&self) -> usize {
        StaticHostProvider::size(self)
    }

    fn next(&self, spin_delay: Duration) -> BoxFuture<'_, ResolvedAddress> {
        Box::pin(StaticHostProvider::next(self, spin_delay))
    }

    fn on_connected(&self) {
        StaticHostProvider::on_connected(self);
    }
}

/// Expands one endpoint into the addresses it names.
async fn expand(
    endpoint: &Endpoint,
    resolver: &dyn HostResolver,
) -> std::result::Result<Vec<ResolvedAddress>, ResolverError> {
    let port = endpoint.port();

    match endpoint.host() {
        Host::Ip { addr, label } => {
            let socket = SocketAddr::new(*addr, port);
            let resolved = match label {
                Some(label) => ResolvedAddress::labeled(label.clone(), socket),
                None => ResolvedAddress::new(socket),
            };
            Ok(vec![resolved])
        },
        Host::Name(name) => {
            let ips = resolver.lookup(name).await?;
            Ok(ips.into_iter().map(|ip| ResolvedAddress::new(SocketAddr::new(ip, port))).collect())
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    /// Advances like `next` does, reporting whether a wait came first.
    fn step(cursor: &mut Cursor, len: usize, may_spin: bool) -> (usize, bool) {
        let spin = may_spin && cursor.must_spin(len);
        (cursor.advance(len), spin)
    }

    #[test]
    fn test_first_advance_never_spins() {
        let mut cursor = Cursor::default();
        assert!(!cursor.must_spin(3));
        assert_eq!(cursor.advance(3), 0);
        assert_eq!(cursor, Cursor { current: Some(0), last: Some(0) });
    }

    #[test]
    fn test_advance_wraps_and_spins_on_last() {
        let mut cursor = Cursor::default();
        assert_eq!(step(&mut cursor, 3, true), (0, false));
        assert_eq!(step(&mut cursor, 3, true), (1, false));
        assert_eq!(step(&mut cursor, 3, true), (2, false));
        assert_eq!(step(&mut cursor, 3, true), (0, true));
        assert_eq!(step(&mut cursor, 3, true), (1, false));
    }

    #[test]
    fn test_spin_check_does_not_move_cursor() {
        let mut cursor = Cursor::default();
        for _ in 0..3 {
            cursor.advance(3);
        }
        let before = cursor;
        assert!(cursor.must_spin(3));
        assert_eq!(cursor.peek(3), 0);
        assert_eq!(cursor, before);
    }

    #[test]
    fn test_advance_without_spin_delay_never_spins() {
        let mut cursor = Cursor::default();
        for round in 0..3 {
            for index in 0..3 {
                assert_eq!(step(&mut cursor, 3, false), (index, false), "round {round}");
            }
        }
        assert_eq!(cursor.last, Some(0));
    }

    #[test]
    fn test_connected_moves_spin_point() {
        let mut cursor = Cursor::default();
        cursor.advance(3);
        cursor.advance(3);
        cursor.connected();
        assert_eq!(cursor.last, Some(1));

        assert_eq!(step(&mut cursor, 3, true), (2, false));
        assert_eq!(step(&mut cursor, 3, true), (0, false));
        assert_eq!(step(&mut cursor, 3, true), (1, true));
    }

    #[test]
    fn test_single_address_spins_every_call_after_first() {
        let mut cursor = Cursor::default();
        assert_eq!(step(&mut cursor, 1, true), (0, false));
        assert_eq!(step(&mut cursor, 1, true), (0, true));
        assert_eq!(step(&mut cursor, 1, true), (0, true));
    }

    #[test]
    fn test_connected_before_any_next_keeps_first_call_rule() {
        let mut cursor = Cursor::default();
        cursor.connected();
        assert_eq!(cursor.last, None);
        assert_eq!(step(&mut cursor, 2, true), (0, false));
    }

    #[test]
    fn test_provider_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StaticHostProvider>();
    }
}
