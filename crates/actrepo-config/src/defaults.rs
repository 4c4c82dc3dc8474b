use camino::Utf8PathBuf;
#[cfg(unix)]
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::mode::FileMode;

/// Default address for the TCP listener.
pub const DEFAULT_LISTEN_IP: &str = "0.0.0.0";

/// Default port for the TCP listener.
pub const DEFAULT_LISTEN_PORT: u16 = 7090;

/// Default owner applied to the Unix socket node.
pub const DEFAULT_SOCKET_OWNER: u32 = 0;

/// Default group applied to the Unix socket node.
pub const DEFAULT_SOCKET_GROUP: u32 = 3000;

/// Default permission bits applied to the Unix socket node.
pub const DEFAULT_SOCKET_MODE: FileMode = FileMode::new(0o664);

/// Default size of a single socket read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Default number of subsystem slots.
pub const DEFAULT_SUBSYSTEMS: usize = 32;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    default_log_filter().to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Owned listen address used by serde and the config loader.
pub fn default_listen_ip() -> String {
    DEFAULT_LISTEN_IP.to_owned()
}

pub(crate) const fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

pub(crate) const fn default_socket_owner() -> u32 {
    DEFAULT_SOCKET_OWNER
}

pub(crate) const fn default_socket_group() -> u32 {
    DEFAULT_SOCKET_GROUP
}

pub(crate) const fn default_socket_mode() -> FileMode {
    DEFAULT_SOCKET_MODE
}

pub(crate) const fn default_read_buffer_size() -> usize {
    DEFAULT_READ_BUFFER_SIZE
}

pub(crate) const fn default_subsystems() -> usize {
    DEFAULT_SUBSYSTEMS
}

/// Computes the default Unix socket path for the daemon.
///
/// The socket lives under the user runtime directory when one exists and
/// under a per-uid namespace of the temporary directory otherwise.
pub fn default_unix_socket() -> Utf8PathBuf {
    default_unix_socket_inner()
}

#[cfg(unix)]
fn default_unix_socket_inner() -> Utf8PathBuf {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("actrepo");
    if apply_namespace {
        base.push(user_namespace());
    }

    base.join("actrepo.sock")
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn default_unix_socket_inner() -> Utf8PathBuf {
    Utf8PathBuf::from("actrepo.sock")
}
