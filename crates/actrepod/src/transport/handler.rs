//! Accepted connection streams and the handler seam the listener calls.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Remote end of an accepted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Peer {
    /// TCP client address.
    Tcp(SocketAddr),
    /// Unix socket client; `None` for unnamed client sockets.
    Unix(Option<PathBuf>),
}

impl fmt::Display for Peer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(formatter, "tcp://{addr}"),
            Self::Unix(Some(path)) => write!(formatter, "unix://{}", path.display()),
            Self::Unix(None) => formatter.write_str("unix:(unnamed)"),
        }
    }
}

/// Stream types accepted by the listener.
#[derive(Debug)]
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Closes both directions. Errors from an already closed socket are
    /// returned to the caller to log or ignore.
    pub(crate) fn shutdown(&self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections on a worker thread.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves one connection to completion. Implementations should not
    /// panic; a panic ends only the worker that raised it.
    fn handle(&self, stream: ConnectionStream, peer: Peer);
}
