//! Public accessor for the language-server byte streams.

use std::sync::Arc;

use crate::selector::ConnectionSelector;
use crate::stream::{InputStream, OutputStream};
use crate::transport::Transport;
use crate::Result;

/// Hands out the input and output streams of the selected transport.
///
/// Holds nothing but the shared selector, so clones can be moved to reader
/// and writer threads freely. The first stream request triggers selection
/// and setup; it may block until a connect or accept completes.
#[derive(Debug, Clone)]
pub struct ConnectionStreams {
    selector: Arc<ConnectionSelector>,
}

impl ConnectionStreams {
    /// Facade over a shared selector.
    #[must_use]
    pub fn new(selector: Arc<ConnectionSelector>) -> Self {
        Self { selector }
    }

    /// Stream the language server reads client messages from.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Connection` if the transport could not be established.
    pub fn input_stream(&self) -> Result<InputStream> {
        self.selector.selected_provider().input_stream()
    }

    /// Stream the language server writes messages to.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Connection` if the transport could not be established.
    pub fn output_stream(&self) -> Result<OutputStream> {
        self.selector.selected_provider().output_stream()
    }

    /// Selected transport.
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.selector.transport()
    }

    /// Underlying selector.
    #[must_use]
    pub fn selector(&self) -> &Arc<ConnectionSelector> {
        &self.selector
    }
}
