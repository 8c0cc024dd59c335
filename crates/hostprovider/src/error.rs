//! Error types for host resolution and provider construction.
//!
//! Provides a two-tier error model:
//! - **Provider errors**: fatal problems surfaced to the caller (empty address
//!   list, malformed endpoint input)
//! - **Resolver errors**: per-endpoint lookup failures that the provider logs
//!   and recovers from during construction

use snafu::{Location, Snafu};

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, HostProviderError>;

/// Errors surfaced to callers of the provider and endpoint parsers.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HostProviderError {
    /// The resolved address list would be empty.
    #[snafu(display("Invalid argument at {location}: {message}"))]
    InvalidArgument {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// An endpoint or connect string could not be parsed.
    #[snafu(display("Invalid endpoint '{input}': {message}"))]
    InvalidEndpoint {
        /// The rejected input.
        input: String,
        /// Parse error description.
        message: String,
    },
}

impl HostProviderError {
    /// Returns true if this error means no provider could be built from the input.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

/// Errors produced while resolving a single host name.
///
/// These never escape provider construction on their own: the failing
/// endpoint is logged and dropped.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ResolverError {
    /// The name is unknown to the resolver.
    #[snafu(display("Unknown host {host}"))]
    NotFound {
        /// Host that failed to resolve.
        host: String,
    },

    /// The lookup succeeded but returned no addresses.
    #[snafu(display("No addresses found for {host}"))]
    NoRecords {
        /// Host that resolved to nothing.
        host: String,
    },

    /// The operating system resolver failed.
    #[snafu(display("Lookup of {host} failed: {source}"))]
    Io {
        /// Host being resolved.
        host: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The DNS client failed.
    #[snafu(display("DNS resolution failed for {host}: {source}"))]
    Dns {
        /// Host being resolved.
        host: String,
        /// Underlying resolver error.
        source: hickory_resolver::ResolveError,
    },
}
