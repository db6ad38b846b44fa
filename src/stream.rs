//! Byte-stream endpoints handed out by a [`StreamProvider`](crate::provider::StreamProvider).
//!
//! Both stream types are cheap handles: cloning one yields another reference
//! to the same underlying channel, so every caller of a provider reads from
//! and writes to the one connection that was established.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

/// Readable half of the selected transport.
#[derive(Debug, Clone)]
pub enum InputStream {
    /// Process standard input. Owned by the process; never closed here.
    Stdin,
    /// Shared TCP connection.
    Socket(Arc<TcpStream>),
}

/// Writable half of the selected transport.
#[derive(Debug, Clone)]
pub enum OutputStream {
    /// Process standard output. Owned by the process; never closed here.
    Stdout,
    /// Shared TCP connection.
    Socket(Arc<TcpStream>),
}

impl InputStream {
    /// Whether both handles read from the same channel.
    #[must_use]
    pub fn same_channel(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Stdin, Self::Stdin) => true,
            (Self::Socket(a), Self::Socket(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Remote address of the socket, `None` for stdin.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Stdin => None,
            Self::Socket(socket) => socket.peer_addr().ok(),
        }
    }
}

impl OutputStream {
    /// Whether both handles write to the same channel.
    #[must_use]
    pub fn same_channel(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Stdout, Self::Stdout) => true,
            (Self::Socket(a), Self::Socket(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Remote address of the socket, `None` for stdout.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Stdout => None,
            Self::Socket(socket) => socket.peer_addr().ok(),
        }
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Stdin => io::stdin().read(buf),
            Self::Socket(socket) => (&**socket).read(buf),
        }
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout => io::stdout().write(buf),
            Self::Socket(socket) => (&**socket).write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().flush(),
            Self::Socket(socket) => (&**socket).flush(),
        }
    }
}

/// Input and output streams of one established transport.
#[derive(Debug, Clone)]
pub struct StreamPair {
    /// Readable half.
    pub input: InputStream,
    /// Writable half.
    pub output: OutputStream,
}

impl StreamPair {
    /// Pair over the process standard input/output handles.
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            input: InputStream::Stdin,
            output: OutputStream::Stdout,
        }
    }

    /// Pair sharing a single TCP connection for both directions.
    #[must_use]
    pub fn socket(socket: TcpStream) -> Self {
        let socket = Arc::new(socket);
        Self {
            input: InputStream::Socket(Arc::clone(&socket)),
            output: OutputStream::Socket(socket),
        }
    }
}
