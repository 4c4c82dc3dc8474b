use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, info};

use super::PROCESS_TARGET;

/// Blocks the daemon until it should shut down.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once shutdown should proceed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        #[source]
        source: io::Error,
    },
}

/// Waits for `SIGTERM`, `SIGINT`, `SIGQUIT` or `SIGHUP`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

/// Shutdown triggered programmatically through a [`ShutdownTrigger`].
///
/// Dropping every trigger also releases the waiter.
#[derive(Debug)]
pub struct ChannelShutdownSignal {
    receiver: Mutex<Receiver<()>>,
}

/// Sending half of a [`ChannelShutdownSignal`].
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    sender: Sender<()>,
}

impl ChannelShutdownSignal {
    /// Creates a signal and the trigger that fires it.
    #[must_use]
    pub fn new() -> (Self, ShutdownTrigger) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                receiver: Mutex::new(receiver),
            },
            ShutdownTrigger { sender },
        )
    }
}

impl ShutdownSignal for ChannelShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        // A disconnected channel means every trigger is gone.
        if receiver.recv().is_err() {
            debug!(target: PROCESS_TARGET, "shutdown triggers dropped");
        }
        info!(target: PROCESS_TARGET, "shutdown requested");
        Ok(())
    }
}

impl ShutdownTrigger {
    /// Fires the signal. Firing after the waiter is gone is a no-op.
    pub fn fire(&self) {
        if self.sender.send(()).is_err() {
            debug!(target: PROCESS_TARGET, "shutdown already observed");
        }
    }
}
