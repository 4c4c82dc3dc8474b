//! Test double for [`HealthReporter`] that records lifecycle events.

use std::net::SocketAddr;
use std::sync::Mutex;

use camino::Utf8Path;

use actrepo_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::transport::ListenerError;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    Listening {
        tcp: Option<SocketAddr>,
        unix: Option<String>,
    },
    ListenFailed(String),
    Stopping,
    Stopped(usize),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Address of the TCP listener, once the daemon reported it.
    pub fn tcp_addr(&self) -> Option<SocketAddr> {
        self.events().into_iter().find_map(|event| match event {
            HealthEvent::Listening { tcp, .. } => tcp,
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listening(&self, tcp: Option<SocketAddr>, unix: Option<&Utf8Path>) {
        self.record(HealthEvent::Listening {
            tcp,
            unix: unix.map(ToString::to_string),
        });
    }

    fn listen_failed(&self, error: &ListenerError) {
        self.record(HealthEvent::ListenFailed(error.to_string()));
    }

    fn stopping(&self) {
        self.record(HealthEvent::Stopping);
    }

    fn stopped(&self, remaining: usize) {
        self.record(HealthEvent::Stopped(remaining));
    }
}
