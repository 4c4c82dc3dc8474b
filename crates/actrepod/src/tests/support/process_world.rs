//! Process lifecycle test world shared across BDD scenarios.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use actrepo_config::SocketEndpoint;

use crate::client::{CommandRequest, send_command};
use crate::health::HealthReporter;
use crate::process::{ChannelShutdownSignal, LaunchError, ShutdownTrigger, run_daemon_with};
use crate::protocol::Response;

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::{HealthEvent, RecordingHealthReporter};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub type StepResult = Result<(), String>;

pub struct ProcessTestWorld {
    loader: TestConfigLoader,
    reporter: Arc<RecordingHealthReporter>,
    trigger: Option<ShutdownTrigger>,
    handle: Option<thread::JoinHandle<Result<(), LaunchError>>>,
    result: Option<Result<(), LaunchError>>,
    reply: Option<Response>,
}

impl Default for ProcessTestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTestWorld {
    pub fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            trigger: None,
            handle: None,
            result: None,
            reply: None,
        }
    }

    /// Runs the daemon on a background thread until shutdown is triggered.
    pub fn start_background(&mut self) -> StepResult {
        if self.handle.is_some() {
            return Err("daemon already running".to_owned());
        }
        let loader = self.loader.clone();
        let reporter = self.reporter.clone() as Arc<dyn HealthReporter>;
        let (signal, trigger) = ChannelShutdownSignal::new();
        self.trigger = Some(trigger);
        self.handle = Some(thread::spawn(move || {
            run_daemon_with(&loader, reporter, &signal)
        }));
        Ok(())
    }

    /// Runs the daemon in the foreground with a loader that always fails.
    pub fn start_with_invalid_config(&mut self) -> StepResult {
        if self.result.is_some() {
            return Err("result already recorded".to_owned());
        }
        let reporter = self.reporter.clone() as Arc<dyn HealthReporter>;
        let (signal, _trigger) = ChannelShutdownSignal::new();
        self.result = Some(run_daemon_with(&FailingConfigLoader, reporter, &signal));
        Ok(())
    }

    /// Waits until the daemon reports it is listening.
    pub fn wait_for_ready(&self) -> StepResult {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            let listening = self
                .reporter
                .events()
                .iter()
                .any(|event| matches!(event, HealthEvent::Listening { .. }));
            if listening && self.socket_exists() {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
        Err(format!(
            "daemon did not become ready; events: {:?}",
            self.reporter.events()
        ))
    }

    /// Sends `request` over the Unix socket and records the reply.
    pub fn send_unix(&mut self, request: &CommandRequest) -> StepResult {
        let endpoint = SocketEndpoint::unix(self.loader.socket_path().to_owned());
        let reply = send_command(&endpoint, request).map_err(|error| error.to_string())?;
        self.reply = Some(reply);
        Ok(())
    }

    /// Sends `request` over TCP and records the reply.
    pub fn send_tcp(&mut self, request: &CommandRequest) -> StepResult {
        let addr = self
            .reporter
            .tcp_addr()
            .ok_or_else(|| "daemon did not report a TCP address".to_owned())?;
        let endpoint = SocketEndpoint::tcp(addr.ip().to_string(), addr.port());
        let reply = send_command(&endpoint, request).map_err(|error| error.to_string())?;
        self.reply = Some(reply);
        Ok(())
    }

    pub fn trigger_shutdown(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            trigger.fire();
        }
    }

    pub fn join_background(&mut self) -> StepResult {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| "daemon not running".to_owned())?;
        let result = handle
            .join()
            .map_err(|_| "daemon thread panicked".to_owned())?;
        self.result = Some(result);
        Ok(())
    }

    pub fn socket_exists(&self) -> bool {
        self.loader.socket_path().as_std_path().exists()
    }

    pub fn reply(&self) -> Option<&Response> {
        self.reply.as_ref()
    }

    pub fn result(&self) -> Option<&Result<(), LaunchError>> {
        self.result.as_ref()
    }

    pub fn events(&self) -> Vec<HealthEvent> {
        self.reporter.events()
    }
}

impl Drop for ProcessTestWorld {
    fn drop(&mut self) {
        self.trigger_shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
