//! One-time transport selection.
//!
//! The selector is constructed once at startup and shared (usually behind an
//! `Arc`) with whatever needs the language-server streams. Its first
//! [`ConnectionSelector::selected_provider`] call applies the selection
//! policy and publishes the provider; every later call returns that same
//! instance.

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::config::ConnectionConfig;
use crate::provider::{SocketOptions, StreamProvider};
use crate::transport::Transport;
use crate::Result;

/// Decides the transport once and owns the resulting provider.
#[derive(Debug)]
pub struct ConnectionSelector {
    config: ConnectionConfig,
    provider: OnceLock<Arc<StreamProvider>>,
}

impl ConnectionSelector {
    /// Selector over an already loaded configuration. Nothing is selected yet.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            provider: OnceLock::new(),
        }
    }

    /// Selector configured from `CLIENT_HOST`, `CLIENT_PORT`, `SERVER_HOST`
    /// and `SERVER_PORT`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a port variable is malformed.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ConnectionConfig::from_env()?))
    }

    /// Configuration the selection is made from.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Provider for the selected transport, created on the first call.
    ///
    /// Concurrent first callers race on a single initialization; exactly one
    /// provider is constructed and all callers receive it. No connection is
    /// attempted here.
    #[must_use]
    pub fn selected_provider(&self) -> Arc<StreamProvider> {
        Arc::clone(self.provider.get_or_init(|| {
            let transport = self.config.transport();
            info!(
                variant = %transport.variant(),
                endpoint = ?transport.endpoint().map(ToString::to_string),
                "selected language server transport"
            );
            Arc::new(StreamProvider::with_options(
                transport,
                SocketOptions::from(&self.config),
            ))
        }))
    }

    /// Selected transport, deciding it if that has not happened yet.
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.selected_provider().transport().clone()
    }

    /// Whether the transport has been decided.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.provider.get().is_some()
    }
}
