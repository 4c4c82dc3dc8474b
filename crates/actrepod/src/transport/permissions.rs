//! Ownership and mode applied to the Unix socket node after binding.

use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use nix::unistd::{Gid, Uid, chown};
use tracing::{debug, warn};

use actrepo_config::{Config, FileMode};

use super::{LISTENER_TARGET, ListenerError};

/// Owner, group and permission bits for the Unix socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketAccess {
    pub owner: u32,
    pub group: u32,
    pub mode: FileMode,
}

impl SocketAccess {
    /// Reads the socket access settings from `config`.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            owner: config.socket_owner,
            group: config.socket_group,
            mode: config.socket_mode,
        }
    }

    /// Applies ownership then mode to `path`.
    ///
    /// Ownership is best effort: an unprivileged daemon cannot hand the
    /// socket to another user, so a failed `chown` is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::UnixPermissions`] when the mode cannot be set.
    pub fn apply(&self, path: &Path) -> Result<(), ListenerError> {
        if let Err(errno) = chown(
            path,
            Some(Uid::from_raw(self.owner)),
            Some(Gid::from_raw(self.group)),
        ) {
            warn!(
                target: LISTENER_TARGET,
                path = %path.display(),
                owner = self.owner,
                group = self.group,
                error = %errno,
                "failed to change unix socket ownership"
            );
        }

        fs::set_permissions(path, Permissions::from_mode(self.mode.bits())).map_err(|source| {
            ListenerError::UnixPermissions {
                path: path.display().to_string(),
                mode: self.mode.to_string(),
                source,
            }
        })?;
        debug!(
            target: LISTENER_TARGET,
            path = %path.display(),
            mode = %self.mode,
            "unix socket permissions applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::MetadataExt;
    use std::os::unix::net::UnixListener;

    use nix::unistd::{getgid, getuid};

    use super::*;

    #[test]
    fn mode_and_ownership_are_applied() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("actrepo.sock");
        let _listener = UnixListener::bind(&path).expect("bind socket");

        let access = SocketAccess {
            owner: getuid().as_raw(),
            group: getgid().as_raw(),
            mode: FileMode::new(0o600),
        };
        access.apply(&path).expect("apply access");

        let metadata = fs::metadata(&path).expect("metadata");
        assert_eq!(metadata.mode() & 0o777, 0o600);
        assert_eq!(metadata.uid(), getuid().as_raw());
    }

    #[test]
    fn ownership_failure_is_not_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("actrepo.sock");
        let _listener = UnixListener::bind(&path).expect("bind socket");

        let access = SocketAccess {
            owner: 0,
            group: 3000,
            mode: FileMode::new(0o664),
        };
        access.apply(&path).expect("mode still applies");

        let metadata = fs::metadata(&path).expect("metadata");
        assert_eq!(metadata.mode() & 0o777, 0o664);
    }

    #[test]
    fn missing_socket_reports_permission_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let access = SocketAccess {
            owner: getuid().as_raw(),
            group: getgid().as_raw(),
            mode: FileMode::new(0o664),
        };
        let error = access
            .apply(&dir.path().join("absent.sock"))
            .expect_err("socket does not exist");
        assert!(matches!(error, ListenerError::UnixPermissions { .. }));
    }
}
