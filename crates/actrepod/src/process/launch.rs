//! Daemon lifecycle: bootstrap, serve until shutdown, drain.

use std::sync::Arc;

use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with};
use crate::dispatch::DispatchConnectionHandler;
use crate::health::HealthReporter;
use crate::transport::{ConnectionHandler, Server};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Runs the daemon with the production collaborators until a termination
/// signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] if bootstrap or binding fails, or if signal
/// handlers cannot be installed.
pub fn run_daemon() -> Result<(), LaunchError> {
    let reporter = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(&SystemConfigLoader, reporter, &SystemShutdownSignal::new())
}

/// Runs the daemon with injected collaborators.
///
/// # Errors
///
/// See [`run_daemon`].
pub fn run_daemon_with<L, S>(
    loader: &L,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &S,
) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let daemon = bootstrap_with(loader, reporter)?;
    serve(&daemon, shutdown)
}

/// Opens the daemon's endpoints, serves until `shutdown` returns, then stops
/// accepting and drains in-flight connections.
///
/// Either both endpoints open or neither does.
///
/// # Errors
///
/// Returns [`LaunchError::Listener`] if binding or stopping fails and
/// [`LaunchError::Shutdown`] if waiting for shutdown fails. The listeners are
/// stopped before a shutdown error is returned.
pub fn serve<S>(daemon: &Daemon, shutdown: &S) -> Result<(), LaunchError>
where
    S: ShutdownSignal + ?Sized,
{
    let reporter = daemon.reporter();
    let config = daemon.config();

    let handler: Arc<dyn ConnectionHandler> = Arc::new(DispatchConnectionHandler::new(
        Arc::clone(daemon.repository()),
        config.read_buffer_size(),
    ));
    let started = Server::bind(config).and_then(|server| server.start(handler));
    let handle = match started {
        Ok(handle) => handle,
        Err(error) => {
            reporter.listen_failed(&error);
            return Err(error.into());
        }
    };
    reporter.listening(handle.tcp_addr(), handle.unix_path());

    let waited = shutdown.wait();
    reporter.stopping();
    info!(
        target: PROCESS_TARGET,
        in_flight = handle.active_workers(),
        "stopping listeners"
    );
    let remaining = handle.stop(SHUTDOWN_TIMEOUT)?;
    reporter.stopped(remaining);
    waited?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
