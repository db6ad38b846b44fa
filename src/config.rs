//! Connection configuration parsing and transport selection policy.
//!
//! Values come from a TOML file, from the process environment
//! (`CLIENT_HOST`, `CLIENT_PORT`, `SERVER_HOST`, `SERVER_PORT`), or from
//! command-line overrides layered on top of either.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::transport::{ConnectionEndpoint, Transport};
use crate::{AppError, Result};

/// Environment variable naming the host to dial in client mode.
pub const CLIENT_HOST_ENV: &str = "CLIENT_HOST";
/// Environment variable naming the port to dial in client mode.
pub const CLIENT_PORT_ENV: &str = "CLIENT_PORT";
/// Environment variable naming the interface to bind in server mode.
pub const SERVER_HOST_ENV: &str = "SERVER_HOST";
/// Environment variable naming the port to listen on in server mode.
pub const SERVER_PORT_ENV: &str = "SERVER_PORT";

/// Host dialed when a client port is configured without a host.
pub const DEFAULT_CLIENT_HOST: &str = "localhost";

fn default_bind_host() -> String {
    "0.0.0.0".into()
}

fn default_true() -> bool {
    true
}

/// Transport configuration, read once at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Host to dial in client mode.
    #[serde(default)]
    pub client_host: Option<String>,
    /// Port to dial in client mode. Takes priority over `server_port`.
    #[serde(default)]
    pub client_port: Option<u16>,
    /// Port to accept one connection on in server mode.
    #[serde(default)]
    pub server_port: Option<u16>,
    /// Interface the server-mode listener binds to.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    /// Per-address connect timeout in client mode; unset blocks until the OS gives up.
    #[serde(default)]
    pub connect_timeout_seconds: Option<u64>,
    /// Disable Nagle's algorithm on the established socket.
    #[serde(default = "default_true")]
    pub tcp_nodelay: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            client_host: None,
            client_port: None,
            server_port: None,
            bind_host: default_bind_host(),
            connect_timeout_seconds: None,
            tcp_nodelay: true,
        }
    }
}

/// Command-line values that replace file or environment settings when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replacement client host.
    pub client_host: Option<String>,
    /// Replacement client port.
    pub client_port: Option<u16>,
    /// Replacement server port.
    pub server_port: Option<u16>,
    /// Replacement bind host.
    pub bind_host: Option<String>,
}

impl ConnectionConfig {
    /// Load configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a port variable is not a valid port number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a port variable is not a valid port number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let config = Self {
            client_host: read(CLIENT_HOST_ENV),
            client_port: read(CLIENT_PORT_ENV)
                .map(|raw| parse_port(CLIENT_PORT_ENV, &raw))
                .transpose()?,
            server_port: read(SERVER_PORT_ENV)
                .map(|raw| parse_port(SERVER_PORT_ENV, &raw))
                .transpose()?,
            bind_host: read(SERVER_HOST_ENV).unwrap_or_else(default_bind_host),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace settings with any values present in `overrides`.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(host) = overrides.client_host {
            self.client_host = Some(host);
        }
        if let Some(port) = overrides.client_port {
            self.client_port = Some(port);
        }
        if let Some(port) = overrides.server_port {
            self.server_port = Some(port);
        }
        if let Some(host) = overrides.bind_host {
            self.bind_host = host;
        }
    }

    /// Transport chosen by this configuration.
    ///
    /// A client port wins over a server port; with neither set, stdio is used.
    /// Hosts are not resolved here.
    #[must_use]
    pub fn transport(&self) -> Transport {
        if let Some(port) = self.client_port {
            let host = self
                .client_host
                .clone()
                .unwrap_or_else(|| DEFAULT_CLIENT_HOST.to_owned());
            return Transport::ClientSocket(ConnectionEndpoint::new(host, port));
        }
        if let Some(port) = self.server_port {
            return Transport::ServerSocket(ConnectionEndpoint::new(self.bind_host.clone(), port));
        }
        Transport::Stdio
    }

    /// Connect timeout as a [`Duration`], if configured.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_seconds.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.bind_host.trim().is_empty() {
            return Err(AppError::Config("bind_host must not be empty".into()));
        }

        if self.connect_timeout_seconds == Some(0) {
            return Err(AppError::Config(
                "connect_timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16> {
    raw.parse::<u16>()
        .map_err(|err| AppError::Config(format!("{key} is not a valid port ('{raw}'): {err}")))
}
