//! Lazy, single-shot establishment of the selected transport.
//!
//! A [`StreamProvider`] performs its variant-specific setup on the first call
//! to any stream accessor and caches the resulting [`StreamPair`]. One mutex
//! covers both accessors, so concurrent first callers block on a single
//! setup and then share its result.
//!
//! Failed setups are not cached: the error goes to the caller that ran the
//! setup and the provider stays uninitialized, so the next accessor call runs
//! the setup again. Retrying is left to callers.

use std::io;
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, info_span, warn};

use crate::config::ConnectionConfig;
use crate::errors::{ConnectionError, ConnectionErrorKind};
use crate::stream::{InputStream, OutputStream, StreamPair};
use crate::transport::{ConnectionEndpoint, Transport, TransportVariant};
use crate::Result;

/// Socket tuning applied when a socket transport is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOptions {
    /// Per-address connect timeout in client mode.
    pub connect_timeout: Option<Duration>,
    /// Set `TCP_NODELAY` on the established socket.
    pub nodelay: bool,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            nodelay: true,
        }
    }
}

impl From<&ConnectionConfig> for SocketOptions {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            nodelay: config.tcp_nodelay,
        }
    }
}

/// Owner of the one stream pair for a transport, established on first use.
#[derive(Debug)]
pub struct StreamProvider {
    transport: Transport,
    options: SocketOptions,
    /// `Some` once setup has succeeded; never reset afterwards.
    pair: Mutex<Option<StreamPair>>,
    /// Mirrors `pair.is_some()`; readable while setup holds the lock.
    initialized: AtomicBool,
    setup_attempts: AtomicUsize,
}

impl StreamProvider {
    /// Provider for `transport` with default socket options.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::with_options(transport, SocketOptions::default())
    }

    /// Provider for `transport` with explicit socket options.
    #[must_use]
    pub fn with_options(transport: Transport, options: SocketOptions) -> Self {
        Self {
            transport,
            options,
            pair: Mutex::new(None),
            initialized: AtomicBool::new(false),
            setup_attempts: AtomicUsize::new(0),
        }
    }

    /// Transport this provider establishes.
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Variant tag of this provider's transport.
    #[must_use]
    pub fn variant(&self) -> TransportVariant {
        self.transport.variant()
    }

    /// Readable half of the transport, establishing it on first use.
    ///
    /// May block on first use until the connect or accept completes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Connection` if the transport could not be established.
    pub fn input_stream(&self) -> Result<InputStream> {
        Ok(self.stream_pair()?.input)
    }

    /// Writable half of the transport, establishing it on first use.
    ///
    /// May block on first use until the connect or accept completes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Connection` if the transport could not be established.
    pub fn output_stream(&self) -> Result<OutputStream> {
        Ok(self.stream_pair()?.output)
    }

    /// Both halves of the transport, establishing it on first use.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Connection` if the transport could not be established.
    pub fn stream_pair(&self) -> Result<StreamPair> {
        self.initialize_with(|| self.establish())
    }

    /// Whether setup has completed successfully.
    ///
    /// Never blocks, even while another caller is parked in connect or accept.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn initialize_with<F>(&self, setup: F) -> Result<StreamPair>
    where
        F: FnOnce() -> Result<StreamPair>,
    {
        // A panic during setup leaves the slot empty, so a poisoned lock is still consistent.
        let mut slot = self.pair.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pair) = slot.as_ref() {
            return Ok(pair.clone());
        }

        let pair = setup()?;
        *slot = Some(pair.clone());
        self.initialized.store(true, Ordering::Release);
        Ok(pair)
    }

    /// Number of times setup has been executed, successful or not.
    #[must_use]
    pub fn setup_attempts(&self) -> usize {
        self.setup_attempts.load(Ordering::SeqCst)
    }

    fn establish(&self) -> Result<StreamPair> {
        self.setup_attempts.fetch_add(1, Ordering::SeqCst);
        let span = info_span!("stream_setup", variant = %self.transport.variant());
        let _entered = span.enter();

        match &self.transport {
            Transport::Stdio => {
                debug!("using process stdio");
                Ok(StreamPair::stdio())
            }
            Transport::ClientSocket(endpoint) => {
                let socket = connect(endpoint, self.options.connect_timeout).map_err(|err| {
                    error!(%endpoint, %err, "failed to connect to client");
                    ConnectionError::new(
                        ConnectionErrorKind::ConnectFailed,
                        endpoint.to_string(),
                        err,
                    )
                })?;
                info!(%endpoint, peer = ?socket.peer_addr().ok(), "connected to client");
                Ok(self.socket_pair(socket))
            }
            Transport::ServerSocket(endpoint) => {
                let socket = accept_once(endpoint)?;
                Ok(self.socket_pair(socket))
            }
        }
    }

    fn socket_pair(&self, socket: TcpStream) -> StreamPair {
        if self.options.nodelay {
            if let Err(err) = socket.set_nodelay(true) {
                warn!(%err, "failed to set TCP_NODELAY");
            }
        }
        StreamPair::socket(socket)
    }
}

/// Dial `endpoint`, trying each resolved address in turn.
fn connect(endpoint: &ConnectionEndpoint, timeout: Option<Duration>) -> io::Result<TcpStream> {
    debug!(%endpoint, ?timeout, "connecting");
    let addrs = (endpoint.resolvable_host(), endpoint.port).to_socket_addrs()?;

    let mut last_err = None;
    for addr in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(socket) => return Ok(socket),
            Err(err) => {
                debug!(%addr, %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "host did not resolve to any address",
        )
    }))
}

/// Bind `endpoint` and accept exactly one peer; the listener is dropped afterwards.
fn accept_once(endpoint: &ConnectionEndpoint) -> Result<TcpStream> {
    let listener =
        TcpListener::bind((endpoint.resolvable_host(), endpoint.port)).map_err(|err| {
            error!(%endpoint, %err, "failed to bind listener");
            ConnectionError::new(ConnectionErrorKind::BindFailed, endpoint.to_string(), err)
        })?;
    info!(%endpoint, local = ?listener.local_addr().ok(), "waiting for client connection");
    accept_from(&listener, endpoint)
}

/// Accept a single peer from `listener`.
fn accept_from(listener: &TcpListener, endpoint: &ConnectionEndpoint) -> Result<TcpStream> {
    let (socket, peer) = listener.accept().map_err(|err| {
        error!(%endpoint, %err, "failed to accept client connection");
        ConnectionError::new(ConnectionErrorKind::AcceptFailed, endpoint.to_string(), err)
    })?;
    info!(%endpoint, %peer, "accepted client connection");
    Ok(socket)
}
