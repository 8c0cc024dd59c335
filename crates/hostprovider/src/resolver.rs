//! Name resolution for symbolic endpoints.
//!
//! The provider only asks a [`HostResolver`] about symbolic names. Literal
//! addresses never reach it, so no implementation is ever asked for a
//! reverse lookup.

use std::{fmt, net::IpAddr};

use futures::future::BoxFuture;
use hickory_resolver::{Resolver, config::ResolverConfig, name_server::TokioConnectionProvider};
use snafu::{ResultExt, ensure};

use crate::error::{DnsSnafu, IoSnafu, NoRecordsSnafu, ResolverError};

/// Result type for a single lookup.
pub type LookupResult = std::result::Result<Vec<IpAddr>, ResolverError>;

/// Injectable forward name resolution.
///
/// A lookup returns every address associated with the name, so a
/// round-robin DNS name expands to all of its members. An empty answer is
/// an error ([`ResolverError::NoRecords`]).
pub trait HostResolver: fmt::Debug + Send + Sync + 'static {
    /// Resolves `host` to all of its addresses.
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, LookupResult>;
}

/// Resolver backed by the operating system (`getaddrinfo`) via tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, LookupResult> {
        Box::pin(lookup_system(host))
    }
}

async fn lookup_system(host: &str) -> LookupResult {
    let addrs = tokio::net::lookup_host((host, 0)).await.context(IoSnafu { host })?;

    // getaddrinfo may repeat an address once per socket type
    let mut ips: Vec<IpAddr> = Vec::new();
    for ip in addrs.map(|addr| addr.ip()) {
        if !ips.contains(&ip) {
            ips.push(ip);
        }
    }

    ensure!(!ips.is_empty(), NoRecordsSnafu { host });
    Ok(ips)
}

/// Resolver backed by hickory-resolver, querying A and AAAA records directly.
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    inner: Resolver<TokioConnectionProvider>,
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HickoryResolver {
    /// Creates a resolver with the default upstream configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Creates a resolver with an explicit upstream configuration.
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        let inner =
            Resolver::builder_with_config(config, TokioConnectionProvider::default()).build();
        Self { inner }
    }

    async fn lookup_dns(&self, host: &str) -> LookupResult {
        let lookup = self.inner.lookup_ip(host).await.context(DnsSnafu { host })?;
        let ips: Vec<IpAddr> = lookup.iter().collect();

        ensure!(!ips.is_empty(), NoRecordsSnafu { host });
        Ok(ips)
    }
}

impl HostResolver for HickoryResolver {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, LookupResult> {
        Box::pin(self.lookup_dns(host))
    }
}
