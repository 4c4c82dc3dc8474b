//! Accept loops for the TCP and Unix endpoints.
//!
//! Each bound endpoint runs its own accept thread. Listeners are
//! non-blocking so the loop can observe the shutdown flag between polls;
//! accepted streams are switched back to blocking mode and handed to a
//! freshly spawned, named worker thread.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use actrepo_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError, Peer};
use super::tracker::WorkerTracker;

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// A bound, not yet accepting, endpoint.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    listener: ListenerKind,
}

#[derive(Debug)]
enum ListenerKind {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl SocketListener {
    /// Binds `endpoint`. Unix endpoints get their parent directory created
    /// and any stale socket file removed first.
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let listener = bind_tcp(host, *port)?;
                Ok(Self {
                    endpoint: endpoint.clone(),
                    listener: ListenerKind::Tcp(listener),
                })
            }
            SocketEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    endpoint.prepare_filesystem()?;
                    let listener = bind_unix(path.as_std_path())?;
                    Ok(Self {
                        endpoint: endpoint.clone(),
                        listener: ListenerKind::Unix(listener),
                    })
                }

                #[cfg(not(unix))]
                {
                    let _ = path;
                    Err(ListenerError::UnsupportedUnix {
                        endpoint: endpoint.to_string(),
                    })
                }
            }
        }
    }

    pub(crate) const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Address actually bound by a TCP listener; `None` for Unix sockets.
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            ListenerKind::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            ListenerKind::Unix(_) => None,
        }
    }

    /// Closes a listener that was never started, removing its socket file.
    pub(crate) fn close(self) {
        #[cfg(unix)]
        cleanup_unix_socket(&self.endpoint);
    }

    /// Starts the accept thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
        tracker: WorkerTracker,
    ) -> Result<ListenerHandle, ListenerError> {
        let endpoint = self.endpoint.to_string();
        if let Err(source) = match &self.listener {
            ListenerKind::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            ListenerKind::Unix(listener) => listener.set_nonblocking(true),
        } {
            #[cfg(unix)]
            cleanup_unix_socket(&self.endpoint);
            return Err(ListenerError::NonBlocking { source });
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let thread_name = match &self.listener {
            ListenerKind::Tcp(_) => "actrepo-accept-tcp",
            #[cfg(unix)]
            ListenerKind::Unix(_) => "actrepo-accept-unix",
        };
        let handle = thread::Builder::new()
            .name(thread_name.to_owned())
            .spawn(move || run_accept_loop(self, &shutdown_flag, &handler, &tracker))
            .map_err(|source| ListenerError::Spawn {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(ListenerHandle {
            endpoint,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to a running accept thread.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    endpoint: String,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop after its current poll.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept thread to exit.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.join().map_err(|_| ListenerError::ThreadPanic {
            endpoint: self.endpoint.clone(),
        })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: SocketListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn ConnectionHandler>,
    tracker: &WorkerTracker,
) {
    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        "socket listener active"
    );
    let mut next_worker: u64 = 0;
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_connection(&listener) {
            Ok(Some((stream, peer))) => {
                last_error = None;
                next_worker = next_worker.wrapping_add(1);
                spawn_worker(next_worker, stream, peer, handler, tracker);
            }
            Ok(None) => thread::sleep(ACCEPT_BACKOFF),
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        endpoint = %listener.endpoint,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }

    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        "socket listener stopped"
    );
    #[cfg(unix)]
    cleanup_unix_socket(&listener.endpoint);
}

fn spawn_worker(
    id: u64,
    stream: ConnectionStream,
    peer: Peer,
    handler: &Arc<dyn ConnectionHandler>,
    tracker: &WorkerTracker,
) {
    let guard = tracker.register();
    let handler = Arc::clone(handler);
    let peer_label = peer.to_string();
    let spawned = thread::Builder::new()
        .name(format!("actrepo-worker-{id}"))
        .spawn(move || {
            let _guard = guard;
            handler.handle(stream, peer);
        });
    match spawned {
        Ok(_) => debug!(
            target: LISTENER_TARGET,
            peer = %peer_label,
            worker = id,
            "connection accepted"
        ),
        // The closure, and with it the stream and guard, is dropped here.
        Err(error) => error!(
            target: LISTENER_TARGET,
            peer = %peer_label,
            error = %error,
            "failed to spawn connection worker; closing connection"
        ),
    }
}

fn accept_connection(
    listener: &SocketListener,
) -> Result<Option<(ConnectionStream, Peer)>, io::Error> {
    match &listener.listener {
        ListenerKind::Tcp(tcp) => match tcp.accept() {
            Ok((stream, addr)) => {
                stream.set_nonblocking(false)?;
                Ok(Some((ConnectionStream::Tcp(stream), Peer::Tcp(addr))))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        },
        #[cfg(unix)]
        ListenerKind::Unix(unix) => match unix.accept() {
            Ok((stream, addr)) => {
                stream.set_nonblocking(false)?;
                let peer = Peer::Unix(addr.as_pathname().map(Path::to_path_buf));
                Ok(Some((ConnectionStream::Unix(stream), peer)))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        },
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}

#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    let display = || path.display().to_string();
    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.file_type().is_socket() => {
            return Err(ListenerError::UnixNotSocket { path: display() });
        }
        Ok(_) => remove_if_stale(path)?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ListenerError::UnixMetadata {
                path: display(),
                source,
            });
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: display(),
        source,
    })
}

/// Removes a socket file nobody is listening on; a live socket is an error.
#[cfg(unix)]
fn remove_if_stale(path: &Path) -> Result<(), ListenerError> {
    match UnixStream::connect(path) {
        Ok(_stream) => Err(ListenerError::UnixInUse {
            path: path.display().to_string(),
        }),
        Err(error)
            if matches!(
                error.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ) =>
        {
            info!(
                target: LISTENER_TARGET,
                path = %path.display(),
                "removing stale unix socket"
            );
            fs::remove_file(path).map_err(|source| ListenerError::UnixCleanup {
                path: path.display().to_string(),
                source,
            })
        }
        Err(source) => Err(ListenerError::UnixConnect {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(unix)]
fn cleanup_unix_socket(endpoint: &SocketEndpoint) {
    let Some(path) = endpoint.unix_path() else {
        return;
    };
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}
