#![forbid(unsafe_code)]

//! Transport selection for language-server processes.
//!
//! Chooses stdio, an outbound TCP connection, or a single accepted inbound
//! TCP connection from configuration, and establishes it lazily on the first
//! stream request.

pub mod config;
pub mod errors;
pub mod facade;
pub mod provider;
pub mod selector;
pub mod stream;
pub mod transport;

pub use config::ConnectionConfig;
pub use errors::{AppError, ConnectionError, ConnectionErrorKind, Result};
pub use facade::ConnectionStreams;
pub use provider::StreamProvider;
pub use selector::ConnectionSelector;
pub use transport::{ConnectionEndpoint, Transport, TransportVariant};
