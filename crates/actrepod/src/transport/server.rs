//! Both listening surfaces of the daemon, bound and started together.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

use actrepo_config::Config;

use super::listener::{ListenerHandle, SocketListener};
use super::tracker::WorkerTracker;
use super::{ConnectionHandler, LISTENER_TARGET, ListenerError};

#[cfg(unix)]
use super::permissions::SocketAccess;

/// TCP and Unix listeners, bound but not yet accepting.
#[derive(Debug)]
pub(crate) struct Server {
    tcp: SocketListener,
    #[cfg(unix)]
    unix: SocketListener,
}

impl Server {
    /// Binds the TCP endpoint, then the Unix endpoint, then applies the Unix
    /// socket's ownership and mode.
    ///
    /// Binding is all-or-nothing: a failure at any step closes whatever was
    /// already bound and removes the Unix socket file.
    pub(crate) fn bind(config: &Config) -> Result<Self, ListenerError> {
        let tcp = SocketListener::bind(&config.tcp_endpoint())?;

        #[cfg(unix)]
        {
            let unix = SocketListener::bind(&config.unix_endpoint())?;
            let access = SocketAccess::from_config(config);
            if let Err(error) = access.apply(config.unix_socket().as_std_path()) {
                unix.close();
                return Err(error);
            }
            Ok(Self { tcp, unix })
        }

        #[cfg(not(unix))]
        Ok(Self { tcp })
    }

    /// Address bound by the TCP listener.
    pub(crate) fn tcp_addr(&self) -> Option<SocketAddr> {
        self.tcp.local_addr()
    }

    /// Starts both accept loops with a shared handler and worker tracker.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ServerHandle, ListenerError> {
        let tracker = WorkerTracker::new();
        let tcp_addr = self.tcp_addr();
        #[cfg(unix)]
        let unix_path = self.unix.endpoint().unix_path().map(Utf8Path::to_path_buf);
        #[cfg(not(unix))]
        let unix_path = None;

        let tcp = self.tcp.start(Arc::clone(&handler), tracker.clone())?;
        #[cfg(unix)]
        let unix = Some(self.unix.start(handler, tracker.clone())?);
        #[cfg(not(unix))]
        let unix = None;

        info!(
            target: LISTENER_TARGET,
            tcp = ?tcp_addr,
            unix = ?unix_path,
            "accepting connections"
        );
        Ok(ServerHandle {
            tcp,
            unix,
            tracker,
            tcp_addr,
            unix_path,
        })
    }
}

/// Running listeners and the workers they spawned.
#[derive(Debug)]
pub(crate) struct ServerHandle {
    tcp: ListenerHandle,
    unix: Option<ListenerHandle>,
    tracker: WorkerTracker,
    tcp_addr: Option<SocketAddr>,
    unix_path: Option<Utf8PathBuf>,
}

impl ServerHandle {
    pub(crate) const fn tcp_addr(&self) -> Option<SocketAddr> {
        self.tcp_addr
    }

    pub(crate) fn unix_path(&self) -> Option<&Utf8Path> {
        self.unix_path.as_deref()
    }

    /// Number of connection workers still running.
    pub(crate) fn active_workers(&self) -> usize {
        self.tracker.active()
    }

    /// Stops both accept loops, then waits up to `drain` for in-flight
    /// connections to finish.
    ///
    /// Returns the number of workers still running when the wait ended.
    pub(crate) fn stop(self, drain: Duration) -> Result<usize, ListenerError> {
        self.tcp.shutdown();
        if let Some(unix) = &self.unix {
            unix.shutdown();
        }

        let tcp_result = self.tcp.join();
        let unix_result = self.unix.map_or(Ok(()), ListenerHandle::join);

        let remaining = self.tracker.wait_idle(drain);
        if remaining > 0 {
            warn!(
                target: LISTENER_TARGET,
                remaining,
                "connection workers still running after drain timeout"
            );
        }
        tcp_result.and(unix_result).map(|()| remaining)
    }
}
