//! Server address selection for clients of a replicated cluster.
//!
//! Given the cluster's endpoints, this crate resolves them to concrete
//! socket addresses once, shuffles them to spread clients across the
//! cluster, and hands them out one at a time in a fixed cycle. The caller
//! owns the sockets: it asks for the next address, dials it, and reports a
//! successful connection back.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use hostprovider::{ConnectString, StaticHostProvider};
//!
//! #[tokio::main]
//! async fn main() -> hostprovider::Result<()> {
//!     let servers = ConnectString::parse("zk1:2181,zk2:2181,zk3:2181/app")?;
//!     let provider = StaticHostProvider::from_endpoints(servers.into_endpoints()).await?;
//!
//!     loop {
//!         let target = provider.next(Duration::from_secs(1)).await;
//!         if let Ok(stream) = tokio::net::TcpStream::connect(target.socket_addr()).await {
//!             provider.on_connected();
//!             // hand `stream` to the session layer
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ConnectString / Endpoint (input, literal-IP flag fixed at parse time)
//!       │
//!       ▼
//! HostResolver (system, hickory, or mock; symbolic names only)
//!       │
//!       ▼
//! StaticHostProvider (shuffle once, cycle, spin delay on full pass)
//!       │
//!       ▼
//! Connection layer (dials, calls on_connected)
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod endpoint;
mod error;
pub mod mock;
mod provider;
mod resolver;

pub use endpoint::{ConnectString, DEFAULT_PORT, Endpoint, Host, ResolvedAddress};
pub use error::{HostProviderError, ResolverError, Result};
pub use provider::{HostProvider, StaticHostProvider};
pub use resolver::{HickoryResolver, HostResolver, LookupResult, SystemResolver};
