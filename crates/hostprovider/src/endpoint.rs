//! Endpoint descriptors and the addresses they resolve to.
//!
//! Whether an endpoint is already a literal IP is decided once, when the
//! endpoint is built or parsed. The provider relies on that flag to skip
//! name resolution and to carry hostname labels through without ever
//! asking the resolver for a reverse lookup.

use std::{
    fmt,
    net::{IpAddr, Ipv6Addr, SocketAddr},
    str::FromStr,
};

use crate::error::{HostProviderError, Result};

/// Port assumed for connect-string entries that omit one.
pub const DEFAULT_PORT: u16 = 2181;

/// The host part of an [`Endpoint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
    /// A symbolic name that must be resolved before dialing.
    Name(String),

    /// An address that is already literal.
    Ip {
        /// The literal address.
        addr: IpAddr,
        /// Optional hostname carried alongside the address for display.
        label: Option<String>,
    },
}

impl Host {
    /// Returns true if no name resolution is needed for this host.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Ip { .. })
    }

    /// Returns the hostname label of a literal host, if one was given.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::Ip { label, .. } => label.as_deref(),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Ip { label: Some(label), .. } => f.write_str(label),
            Self::Ip { addr: IpAddr::V6(addr), label: None } => write!(f, "[{addr}]"),
            Self::Ip { addr: IpAddr::V4(addr), label: None } => write!(f, "{addr}"),
        }
    }
}

/// A caller-supplied cluster member: host (symbolic or literal) plus port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: Host,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint from a host and port.
    #[must_use]
    pub fn new(host: Host, port: u16) -> Self {
        Self { host, port }
    }

    /// Creates an endpoint for a symbolic host name.
    ///
    /// The name is always sent to the resolver, even if it happens to look
    /// like an address. Use [`str::parse`] to detect literals from text.
    #[must_use]
    pub fn name(name: impl Into<String>, port: u16) -> Self {
        Self::new(Host::Name(name.into()), port)
    }

    /// Creates an endpoint for a literal address without a hostname label.
    #[must_use]
    pub fn ip(addr: IpAddr, port: u16) -> Self {
        Self::new(Host::Ip { addr, label: None }, port)
    }

    /// Creates an endpoint for a literal address that keeps a hostname label.
    #[must_use]
    pub fn labeled(label: impl Into<String>, addr: IpAddr, port: u16) -> Self {
        Self::new(Host::Ip { addr, label: Some(label.into()) }, port)
    }

    /// Returns the host part.
    #[must_use]
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns true if the endpoint carries a literal address.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.host.is_literal()
    }

    /// Parses `host:port`, `ipv4:port` or `[ipv6]:port`, falling back to
    /// `default_port` when the port is omitted or empty (`zk1:`).
    ///
    /// # Errors
    ///
    /// Returns `HostProviderError::InvalidEndpoint` if the host is empty,
    /// brackets are unbalanced, or the port is missing (with no default) or
    /// not a valid `u16`.
    pub fn parse_with_default_port(input: &str, default_port: Option<u16>) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = |message: &str| HostProviderError::InvalidEndpoint {
            input: input.to_owned(),
            message: message.to_owned(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty host"));
        }

        let (host, port) = if let Some(rest) = trimmed.strip_prefix('[') {
            let (inner, after) = rest.split_once(']').ok_or_else(|| invalid("unbalanced brackets"))?;
            let addr: Ipv6Addr = inner.parse().map_err(|_| invalid("invalid IPv6 literal"))?;
            let port = match after {
                "" => None,
                _ => Some(after.strip_prefix(':').ok_or_else(|| invalid("expected ':' after ']'"))?),
            };
            (Host::Ip { addr: IpAddr::V6(addr), label: None }, port)
        } else if let Ok(addr) = trimmed.parse::<Ipv6Addr>() {
            // Bare IPv6 literals cannot carry a port.
            (Host::Ip { addr: IpAddr::V6(addr), label: None }, None)
        } else {
            let (host, port) = match trimmed.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (trimmed, None),
            };
            if host.is_empty() {
                return Err(invalid("empty host"));
            }
            if host.contains(['[', ']']) {
                return Err(invalid("unbalanced brackets"));
            }
            let host = match host.parse::<IpAddr>() {
                Ok(addr) => Host::Ip { addr, label: None },
                Err(_) => Host::Name(host.to_owned()),
            };
            (host, port)
        };

        // A trailing ':' counts as an omitted port.
        let port = match (port.filter(|port| !port.is_empty()), default_port) {
            (Some(port), _) => port.parse::<u16>().map_err(|_| invalid("invalid port"))?,
            (None, Some(default)) => default,
            (None, None) => return Err(invalid("missing port")),
        };

        Ok(Self { host, port })
    }
}

impl FromStr for Endpoint {
    type Err = HostProviderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with_default_port(s, None)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::ip(addr.ip(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A comma-separated server list with an optional chroot suffix.
///
/// ```text
/// zk1:2181,zk2:2181,[::1]:2182/app/config
/// ```
///
/// Entries without a port get [`DEFAULT_PORT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectString {
    endpoints: Vec<Endpoint>,
    chroot: Option<String>,
}

impl ConnectString {
    /// Parses a connect string.
    ///
    /// # Errors
    ///
    /// Returns `HostProviderError::InvalidEndpoint` if any server entry is
    /// malformed, or if the chroot path ends with `/`, contains an empty,
    /// `.` or `..` segment, or contains a NUL character.
    pub fn parse(input: &str) -> Result<Self> {
        let (servers, chroot) = match input.find('/') {
            Some(idx) => (&input[..idx], Some(&input[idx..])),
            None => (input, None),
        };

        let chroot = match chroot {
            None | Some("/") => None,
            Some(path) => {
                if !is_valid_chroot(path) {
                    return Err(HostProviderError::InvalidEndpoint {
                        input: input.to_owned(),
                        message: format!("invalid chroot path {path}"),
                    });
                }
                Some(path.to_owned())
            },
        };

        let endpoints = servers
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| Endpoint::parse_with_default_port(entry, Some(DEFAULT_PORT)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { endpoints, chroot })
    }

    /// Returns the parsed server endpoints, in input order.
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Returns the chroot path, if any.
    #[must_use]
    pub fn chroot(&self) -> Option<&str> {
        self.chroot.as_deref()
    }

    /// Consumes the connect string, returning its endpoints.
    #[must_use]
    pub fn into_endpoints(self) -> Vec<Endpoint> {
        self.endpoints
    }
}

/// Checks an absolute chroot path other than `/`.
fn is_valid_chroot(path: &str) -> bool {
    !path.contains('\0')
        && path
            .split('/')
            .skip(1)
            .all(|segment| !matches!(segment, "" | "." | ".."))
}

impl FromStr for ConnectString {
    type Err = HostProviderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A concrete socket address produced by expanding an [`Endpoint`].
///
/// Rendering never triggers a lookup: the hostname, when present, was
/// already known from the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedAddress {
    addr: SocketAddr,
    hostname: Option<String>,
}

impl ResolvedAddress {
    /// Creates an address without a hostname label.
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, hostname: None }
    }

    /// Creates an address that keeps a hostname label.
    #[must_use]
    pub fn labeled(hostname: impl Into<String>, addr: SocketAddr) -> Self {
        Self { addr, hostname: Some(hostname.into()) }
    }

    /// Returns the socket address to dial.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the IP address.
    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the hostname label, if known.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }
}

impl From<ResolvedAddress> for SocketAddr {
    fn from(addr: ResolvedAddress) -> Self {
        addr.addr
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hostname {
            Some(hostname) => write!(f, "{hostname}/{}", self.addr),
            None => write!(f, "{}", self.addr),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_parse_name_and_port() {
        let endpoint: Endpoint = "zk1.example.com:2181".parse().unwrap();
        assert_eq!(endpoint.host(), &Host::Name("zk1.example.com".to_owned()));
        assert_eq!(endpoint.port(), 2181);
        assert!(!endpoint.is_literal());
    }

    #[test]
    fn test_parse_ipv4_literal_is_flagged() {
        let endpoint: Endpoint = "10.0.0.1:2181".parse().unwrap();
        assert!(endpoint.is_literal());
        assert_eq!(endpoint, Endpoint::ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 2181));
    }

    #[test]
    fn test_parse_bracketed_ipv6() {
        let endpoint: Endpoint = "[::1]:2182".parse().unwrap();
        assert_eq!(endpoint, Endpoint::ip(IpAddr::V6(Ipv6Addr::LOCALHOST), 2182));
        assert_eq!(endpoint.to_string(), "[::1]:2182");
    }

    #[test]
    fn test_parse_bare_ipv6_uses_default_port() {
        let endpoint = Endpoint::parse_with_default_port("fe80::1", Some(DEFAULT_PORT)).unwrap();
        assert!(endpoint.is_literal());
        assert_eq!(endpoint.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_parse_missing_port_without_default_fails() {
        let err = "zk1".parse::<Endpoint>().unwrap_err();
        assert!(err.to_string().contains("missing port"));

        let err = "zk1:".parse::<Endpoint>().unwrap_err();
        assert!(err.to_string().contains("missing port"));
    }

    #[test]
    fn test_parse_trailing_colon_uses_default_port() {
        let endpoint = Endpoint::parse_with_default_port("zk1:", Some(DEFAULT_PORT)).unwrap();
        assert_eq!(endpoint, Endpoint::name("zk1", DEFAULT_PORT));

        let parsed = ConnectString::parse("zk1:,10.0.0.2:/app").unwrap();
        assert_eq!(parsed.endpoints()[0], Endpoint::name("zk1", DEFAULT_PORT));
        assert_eq!(parsed.endpoints()[1].port(), DEFAULT_PORT);
        assert_eq!(parsed.chroot(), Some("/app"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in ["", "  ", ":2181", "zk1:99999", "zk1:port", "[::1:2181", "[::1]2181", "[zk1]:1"]
        {
            assert!(input.parse::<Endpoint>().is_err(), "expected {input:?} to be rejected");
        }
    }

    #[test]
    fn test_labeled_endpoint_display() {
        let endpoint =
            Endpoint::labeled("zk1.internal", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 2181);
        assert!(endpoint.is_literal());
        assert_eq!(endpoint.host().label(), Some("zk1.internal"));
        assert_eq!(endpoint.to_string(), "zk1.internal:2181");
    }

    #[test]
    fn test_endpoint_from_socket_addr() {
        let addr: SocketAddr = "10.0.0.7:2888".parse().unwrap();
        let endpoint = Endpoint::from(addr);
        assert!(endpoint.is_literal());
        assert_eq!(endpoint.port(), 2888);
        assert_eq!(endpoint.host().label(), None);
    }

    #[test]
    fn test_connect_string_defaults_port_and_skips_empty_entries() {
        let parsed = ConnectString::parse("zk1, zk2:2182,,10.0.0.3").unwrap();
        let endpoints = parsed.endpoints();
        assert_eq!(endpoints.len(), 3);
        assert_eq!(endpoints[0], Endpoint::name("zk1", DEFAULT_PORT));
        assert_eq!(endpoints[1], Endpoint::name("zk2", 2182));
        assert_eq!(endpoints[2], Endpoint::ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 3)), 2181));
        assert_eq!(parsed.chroot(), None);
    }

    #[test]
    fn test_connect_string_chroot() {
        let parsed: ConnectString = "zk1:2181,[::1]:2182/app/config".parse().unwrap();
        assert_eq!(parsed.endpoints().len(), 2);
        assert_eq!(parsed.chroot(), Some("/app/config"));

        let parsed = ConnectString::parse("zk1:2181/").unwrap();
        assert_eq!(parsed.chroot(), None);
    }

    #[test]
    fn test_connect_string_rejects_bad_chroot() {
        assert!(ConnectString::parse("zk1:2181/app/").is_err());
        assert!(ConnectString::parse("zk1:2181/app//config").is_err());
        assert!(ConnectString::parse("zk1:2181/app/./config").is_err());
        assert!(ConnectString::parse("zk1:2181/app/..").is_err());
        assert!(ConnectString::parse("zk1:2181/..").is_err());
        assert!(ConnectString::parse("zk1:2181/app\0").is_err());

        let parsed = ConnectString::parse("zk1:2181/app/.hidden/..config").unwrap();
        assert_eq!(parsed.chroot(), Some("/app/.hidden/..config"));
    }

    #[test]
    fn test_connect_string_propagates_entry_errors() {
        let err = ConnectString::parse("zk1:2181,zk2:notaport").unwrap_err();
        match err {
            HostProviderError::InvalidEndpoint { input, .. } => assert_eq!(input, "zk2:notaport"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolved_address_display_never_needs_lookup() {
        let addr: SocketAddr = "10.0.0.1:2181".parse().unwrap();
        assert_eq!(ResolvedAddress::new(addr).to_string(), "10.0.0.1:2181");
        assert_eq!(
            ResolvedAddress::labeled("zk1.internal", addr).to_string(),
            "zk1.internal/10.0.0.1:2181"
        );
    }
}
