use std::time::Duration;

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::{run_daemon, run_daemon_with, serve};
pub use shutdown::{
    ChannelShutdownSignal, ShutdownError, ShutdownSignal, ShutdownTrigger, SystemShutdownSignal,
};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Upper bound on waiting for in-flight connections at shutdown.
pub(crate) const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
