//! In-memory resolver for deterministic tests.
//!
//! # Example
//!
//! ```no_run
//! use std::{net::IpAddr, sync::Arc};
//!
//! use hostprovider::{Endpoint, StaticHostProvider, mock::MockResolver};
//!
//! # async fn example() -> hostprovider::Result<()> {
//! let resolver = Arc::new(
//!     MockResolver::new()
//!         .with_host("zk.example.com", ["10.0.0.1".parse::<IpAddr>().unwrap()]),
//! );
//!
//! let provider = StaticHostProvider::builder()
//!     .endpoints(vec![Endpoint::name("zk.example.com", 2181)])
//!     .resolver(resolver.clone())
//!     .seed(7)
//!     .build()
//!     .await?;
//! assert_eq!(provider.size(), 1);
//! assert_eq!(resolver.lookup_count(), 1);
//! # Ok(())
//! # }
//! ```

use std::{
    collections::HashMap,
    net::IpAddr,
    sync::atomic::{AtomicUsize, Ordering},
};

use futures::future::BoxFuture;
use parking_lot::RwLock;

use crate::{
    error::ResolverError,
    resolver::{HostResolver, LookupResult},
};

/// A name → addresses table standing in for DNS.
///
/// Unknown names fail with [`ResolverError::NotFound`]; names registered
/// with no addresses fail with [`ResolverError::NoRecords`].
#[derive(Debug, Default)]
pub struct MockResolver {
    /// Registered names.
    records: RwLock<HashMap<String, Vec<IpAddr>>>,

    /// Total lookups served, including failed ones.
    lookups: AtomicUsize,
}

impl MockResolver {
    /// Creates an empty resolver; every lookup fails until names are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `host` and returns the resolver, for chained setup.
    #[must_use]
    pub fn with_host(self, host: impl Into<String>, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.insert(host, ips);
        self
    }

    /// Registers or replaces the addresses for `host`.
    pub fn insert(&self, host: impl Into<String>, ips: impl IntoIterator<Item = IpAddr>) {
        self.records.write().insert(host.into(), ips.into_iter().collect());
    }

    /// Returns how many lookups have been served.
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl HostResolver for MockResolver {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, LookupResult> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let result = match self.records.read().get(host) {
            None => Err(ResolverError::NotFound { host: host.to_owned() }),
            Some(ips) if ips.is_empty() => Err(ResolverError::NoRecords { host: host.to_owned() }),
            Some(ips) => Ok(ips.clone()),
        };

        Box::pin(futures::future::ready(result))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[tokio::test]
    async fn test_lookup_registered_host() {
        let resolver = MockResolver::new().with_host("zk.example.com", [ip(1), ip(2)]);
        let ips = resolver.lookup("zk.example.com").await.unwrap();
        assert_eq!(ips, vec![ip(1), ip(2)]);
        assert_eq!(resolver.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_host() {
        let resolver = MockResolver::new();
        let err = resolver.lookup("bad.invalid.host").await.unwrap_err();
        assert!(matches!(err, ResolverError::NotFound { .. }));
        assert_eq!(resolver.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_empty_record() {
        let resolver = MockResolver::new().with_host("empty.example", []);
        let err = resolver.lookup("empty.example").await.unwrap_err();
        assert!(matches!(err, ResolverError::NoRecords { .. }));
    }

    #[tokio::test]
    async fn test_insert_replaces_records() {
        let resolver = MockResolver::new().with_host("zk", [ip(1)]);
        resolver.insert("zk", [ip(9)]);
        assert_eq!(resolver.lookup("zk").await.unwrap(), vec![ip(9)]);
    }
}
