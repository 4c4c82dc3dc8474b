//! Structured health reporting for daemon lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use camino::Utf8Path;

use actrepo_config::Config;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer for lifecycle events.
pub trait HealthReporter: Send + Sync {
    /// Configuration loading is about to begin.
    fn bootstrap_starting(&self);

    /// Configuration loaded and the repository is ready.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Bootstrap failed.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Both endpoints are bound and accepting.
    fn listening(&self, tcp: Option<SocketAddr>, unix: Option<&Utf8Path>);

    /// Binding or starting the endpoints failed.
    fn listen_failed(&self, error: &ListenerError);

    /// A shutdown was requested.
    fn stopping(&self);

    /// Listeners are closed; `remaining` workers outlived the drain.
    fn stopped(&self, remaining: usize);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listening(&self, tcp: Option<SocketAddr>, unix: Option<&Utf8Path>) {
        (**self).listening(tcp, unix);
    }

    fn listen_failed(&self, error: &ListenerError) {
        (**self).listen_failed(error);
    }

    fn stopping(&self) {
        (**self).stopping();
    }

    fn stopped(&self, remaining: usize) {
        (**self).stopped(remaining);
    }
}

/// Reporter that records lifecycle events with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            tcp = %config.tcp_endpoint(),
            unix = %config.unix_endpoint(),
            subsystems = config.subsystems(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn listening(&self, tcp: Option<SocketAddr>, unix: Option<&Utf8Path>) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listening",
            tcp = ?tcp,
            unix = ?unix,
            "daemon accepting connections"
        );
    }

    fn listen_failed(&self, error: &ListenerError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "listen_failed",
            error = %error,
            "failed to open listening endpoints"
        );
    }

    fn stopping(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "stopping",
            "daemon shutting down"
        );
    }

    fn stopped(&self, remaining: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "stopped",
            remaining_workers = remaining,
            "daemon stopped"
        );
    }
}
