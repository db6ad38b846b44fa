//! Error types shared across the crate.

use std::fmt::{Display, Formatter};
use std::io;

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Which stage of transport setup failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConnectionErrorKind {
    /// Dialing the configured client host/port did not succeed.
    ConnectFailed,
    /// The server-mode listener could not be bound.
    BindFailed,
    /// The server-mode listener failed while waiting for its peer.
    AcceptFailed,
}

impl Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectFailed => f.write_str("connect failed"),
            Self::BindFailed => f.write_str("bind failed"),
            Self::AcceptFailed => f.write_str("accept failed"),
        }
    }
}

/// Transport setup failure for a socket endpoint.
#[derive(Debug)]
pub struct ConnectionError {
    /// Failed setup stage.
    pub kind: ConnectionErrorKind,
    /// `host:port` the setup was attempted against.
    pub endpoint: String,
    /// Underlying I/O failure.
    pub source: io::Error,
}

impl ConnectionError {
    pub(crate) fn new(
        kind: ConnectionErrorKind,
        endpoint: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Self {
            kind,
            endpoint: endpoint.into(),
            source,
        }
    }
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.endpoint, self.source)
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Application error enumeration covering all failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Transport setup failure (connect, bind or accept).
    Connection(ConnectionError),
    /// File-system or stream I/O failure.
    Io(String),
}

impl AppError {
    /// Setup stage that failed, if this is a connection error.
    #[must_use]
    pub fn connection_kind(&self) -> Option<ConnectionErrorKind> {
        match self {
            Self::Connection(err) => Some(err.kind),
            _ => None,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Connection(err) => write!(f, "connection: {err}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connection(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConnectionError> for AppError {
    fn from(err: ConnectionError) -> Self {
        Self::Connection(err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
