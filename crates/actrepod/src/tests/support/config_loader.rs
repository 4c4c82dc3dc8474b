//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use nix::unistd::{getgid, getuid};
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use actrepo_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that binds an ephemeral loopback port and a Unix socket under a
/// temporary directory owned by the current user.
#[derive(Clone)]
pub struct TestConfigLoader {
    _socket_dir: Arc<TempDir>,
    socket_path: Utf8PathBuf,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        let socket_path = Utf8PathBuf::from_path_buf(dir.path().join("run").join("actrepod.sock"))
            .expect("temporary socket path was not valid UTF-8");
        Self {
            _socket_dir: Arc::new(dir),
            socket_path,
        }
    }

    /// Path the daemon binds its Unix socket to.
    pub fn socket_path(&self) -> &Utf8Path {
        &self.socket_path
    }

    /// Builds the configuration this loader returns.
    pub fn config(&self) -> Config {
        Config {
            listen_ip: "127.0.0.1".to_owned(),
            listen_port: 0,
            unix_socket: self.socket_path.clone(),
            socket_owner: getuid().as_raw(),
            socket_group: getgid().as_raw(),
            ..Config::default()
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config())
    }
}

/// Loader that fails by passing a non-numeric port on the command line.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("actrepod"),
            OsString::from("--listen-port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
