//! Daemon bootstrap: configuration, telemetry and the action repository.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use actrepo_config::Config;

use crate::actions::{ActionList, ActionRepository, RepositoryError, system};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Source of the daemon configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`], reading CLI arguments,
/// `ACTREPO_*` environment variables and configuration files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
    /// Built-in subsystems could not be registered.
    #[error("failed to register built-in actions: {source}")]
    Registry {
        #[source]
        source: RepositoryError,
    },
}

/// A bootstrapped daemon, ready to open its endpoints.
pub struct Daemon {
    config: Config,
    repository: Arc<ActionRepository>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Shared action repository.
    #[must_use]
    pub const fn repository(&self) -> &Arc<ActionRepository> {
        &self.repository
    }

    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    pub(crate) fn reporter(&self) -> &dyn HealthReporter {
        self.reporter.as_ref()
    }

    /// Registers a subsystem's action list before serving.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BadModule`] if `sid` is outside the
    /// configured number of subsystems.
    pub fn register(&self, sid: i64, list: ActionList) -> Result<(), RepositoryError> {
        self.repository.register(sid, Arc::new(list))
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Daemon")
            .field("config", &self.config)
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or built-in
/// registration fails. Each failure is also reported to `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let result = load_and_prepare(loader);
    match result {
        Ok((config, repository, telemetry)) => {
            reporter.bootstrap_succeeded(&config);
            Ok(Daemon {
                config,
                repository,
                telemetry,
                reporter,
            })
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn load_and_prepare(
    loader: &dyn ConfigLoader,
) -> Result<(Config, Arc<ActionRepository>, TelemetryHandle), BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    let repository = Arc::new(ActionRepository::new(config.subsystems()));
    system::register_system_actions(&repository)
        .map_err(|source| BootstrapError::Registry { source })?;

    Ok((config, repository, telemetry))
}
