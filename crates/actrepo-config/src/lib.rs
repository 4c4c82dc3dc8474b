//! Shared configuration for the action repository daemon.
//!
//! Configuration is layered by [`ortho_config`]: command-line flags override
//! `ACTREPO_*` environment variables, which override the configuration file,
//! which overrides the built-in defaults. The daemon reads the final values
//! once, before the listeners are bound.

mod defaults;
mod logging;
mod mode;
mod socket;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LISTEN_IP, DEFAULT_LISTEN_PORT, DEFAULT_LOG_FILTER, DEFAULT_READ_BUFFER_SIZE,
    DEFAULT_SOCKET_GROUP, DEFAULT_SOCKET_MODE, DEFAULT_SOCKET_OWNER, DEFAULT_SUBSYSTEMS,
    default_listen_ip, default_log_filter, default_log_filter_string, default_log_format,
    default_unix_socket,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use mode::{FileMode, FileModeParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "ACTREPO")]
pub struct Config {
    /// Address the TCP listener binds to.
    #[serde(default = "defaults::default_listen_ip")]
    #[ortho_config(default = defaults::default_listen_ip())]
    pub listen_ip: String,
    /// Port the TCP listener binds to.
    #[serde(default = "defaults::default_listen_port")]
    #[ortho_config(default = defaults::DEFAULT_LISTEN_PORT)]
    pub listen_port: u16,
    /// Filesystem path of the Unix domain socket.
    #[serde(default = "defaults::default_unix_socket")]
    #[ortho_config(default = defaults::default_unix_socket())]
    pub unix_socket: Utf8PathBuf,
    /// User id applied to the Unix socket node after binding.
    #[serde(default = "defaults::default_socket_owner")]
    #[ortho_config(default = defaults::DEFAULT_SOCKET_OWNER)]
    pub socket_owner: u32,
    /// Group id applied to the Unix socket node after binding.
    #[serde(default = "defaults::default_socket_group")]
    #[ortho_config(default = defaults::DEFAULT_SOCKET_GROUP)]
    pub socket_group: u32,
    /// Permission bits applied to the Unix socket node after binding.
    #[serde(default = "defaults::default_socket_mode")]
    #[ortho_config(default = defaults::DEFAULT_SOCKET_MODE)]
    pub socket_mode: FileMode,
    /// Size of each socket read issued by a connection worker.
    #[serde(default = "defaults::default_read_buffer_size")]
    #[ortho_config(default = defaults::DEFAULT_READ_BUFFER_SIZE)]
    pub read_buffer_size: usize,
    /// Number of subsystem slots in the action repository.
    #[serde(default = "defaults::default_subsystems")]
    #[ortho_config(default = defaults::DEFAULT_SUBSYSTEMS)]
    pub subsystems: usize,
    /// `tracing` filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_ip: defaults::default_listen_ip(),
            listen_port: DEFAULT_LISTEN_PORT,
            unix_socket: defaults::default_unix_socket(),
            socket_owner: DEFAULT_SOCKET_OWNER,
            socket_group: DEFAULT_SOCKET_GROUP,
            socket_mode: DEFAULT_SOCKET_MODE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            subsystems: DEFAULT_SUBSYSTEMS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// TCP endpoint built from the listen address and port.
    #[must_use]
    pub fn tcp_endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::tcp(self.listen_ip.clone(), self.listen_port)
    }

    /// Unix endpoint built from the socket path.
    #[must_use]
    pub fn unix_endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::unix(self.unix_socket.clone())
    }

    /// Listen address for the TCP endpoint.
    #[must_use]
    pub fn listen_ip(&self) -> &str {
        &self.listen_ip
    }

    /// Overrides the TCP listen address.
    pub fn set_listen_ip(&mut self, ip: impl Into<String>) {
        self.listen_ip = ip.into();
    }

    /// Port for the TCP endpoint.
    #[must_use]
    pub const fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// Overrides the TCP listen port.
    pub fn set_listen_port(&mut self, port: u16) {
        self.listen_port = port;
    }

    /// Path of the Unix domain socket.
    #[must_use]
    pub fn unix_socket(&self) -> &camino::Utf8Path {
        self.unix_socket.as_path()
    }

    /// Overrides the Unix domain socket path.
    pub fn set_unix_socket(&mut self, path: impl Into<Utf8PathBuf>) {
        self.unix_socket = path.into();
    }

    /// Size of a single socket read.
    #[must_use]
    pub const fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    /// Overrides the socket read size. Zero is clamped to one byte.
    pub fn set_read_buffer_size(&mut self, size: usize) {
        self.read_buffer_size = size.max(1);
    }

    /// Number of subsystem slots in the action repository.
    #[must_use]
    pub const fn subsystems(&self) -> usize {
        self.subsystems
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
