//! Command-dispatch daemon.
//!
//! Subsystems publish numbered actions into a shared [`ActionRepository`].
//! The daemon listens on a TCP port and a Unix domain socket; each
//! connection carries one length-prefixed XML command naming a subsystem id
//! and command id, which is routed through the repository and answered with
//! one XML response envelope.
//!
//! [`run_daemon`] wires the pieces together: configuration via
//! [`actrepo_config`], structured telemetry, the built-in `system`
//! subsystem, both listeners and signal-driven shutdown. Embedders that want
//! to add their own subsystems call [`bootstrap_with`], register lists on
//! the returned [`Daemon`] and hand it to [`serve`].

pub mod actions;
mod bootstrap;
pub mod client;
pub mod dispatch;
mod health;
mod process;
pub mod protocol;
pub mod telemetry;
mod transport;

pub use actions::{
    ActionContext, ActionError, ActionList, ActionRepository, ActionSource, RepositoryError,
    Severity,
};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    ChannelShutdownSignal, LaunchError, ShutdownError, ShutdownSignal, ShutdownTrigger,
    SystemShutdownSignal, run_daemon, run_daemon_with, serve,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ListenerError, Peer, WorkerGuard, WorkerTracker};

#[cfg(test)]
mod tests;
