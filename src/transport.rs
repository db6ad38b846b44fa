//! Transport variants and socket endpoints.
//!
//! A [`Transport`] is decided once from configuration and never changes for
//! the lifetime of the owning selector.

use std::fmt::{Display, Formatter};

/// Tag naming which of the three transport kinds is in use.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TransportVariant {
    /// Process standard input/output.
    Stdio,
    /// Outbound TCP connection dialed by this process.
    ClientSocket,
    /// Inbound TCP connection accepted once by this process.
    ServerSocket,
}

impl Display for TransportVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => f.write_str("stdio"),
            Self::ClientSocket => f.write_str("client_socket"),
            Self::ServerSocket => f.write_str("server_socket"),
        }
    }
}

/// Host and port of a socket transport.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ConnectionEndpoint {
    /// Host name or address literal.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl ConnectionEndpoint {
    /// Build an endpoint from a host and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host with any IPv6 brackets removed, suitable for address resolution.
    #[must_use]
    pub fn resolvable_host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|host| host.strip_suffix(']'))
            .unwrap_or(&self.host)
    }
}

impl Display for ConnectionEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Bracket IPv6 literals so the result stays parseable as a socket address.
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// The selected transport together with the endpoint it needs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Transport {
    /// Use the process standard input/output handles.
    Stdio,
    /// Dial out to the endpoint.
    ClientSocket(ConnectionEndpoint),
    /// Bind the endpoint and accept exactly one peer.
    ServerSocket(ConnectionEndpoint),
}

impl Transport {
    /// Variant tag of this transport.
    #[must_use]
    pub fn variant(&self) -> TransportVariant {
        match self {
            Self::Stdio => TransportVariant::Stdio,
            Self::ClientSocket(_) => TransportVariant::ClientSocket,
            Self::ServerSocket(_) => TransportVariant::ServerSocket,
        }
    }

    /// Socket endpoint, or `None` for stdio.
    #[must_use]
    pub fn endpoint(&self) -> Option<&ConnectionEndpoint> {
        match self {
            Self::Stdio => None,
            Self::ClientSocket(endpoint) | Self::ServerSocket(endpoint) => Some(endpoint),
        }
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.endpoint() {
            Some(endpoint) => write!(f, "{} {endpoint}", self.variant()),
            None => write!(f, "{}", self.variant()),
        }
    }
}
