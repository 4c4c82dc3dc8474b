//! Built-in diagnostic subsystem registered by the daemon.
//!
//! | cid | name      | result                                             |
//! |-----|-----------|----------------------------------------------------|
//! | 0   | `ping`    | `pong`                                             |
//! | 1   | `modules` | registered subsystems as `sid:module`, one per line |
//! | 2   | `echo`    | text of the command's `<text>` element              |

use std::sync::{Arc, Weak};

use super::{ActionError, ActionList, ActionRepository, RepositoryError};

/// Subsystem id reserved for the built-in actions.
pub const SYSTEM_SUBSYSTEM: i64 = 0;

/// Command id of `ping`.
pub const PING: i64 = 0;
/// Command id of `modules`.
pub const MODULES: i64 = 1;
/// Command id of `echo`.
pub const ECHO: i64 = 2;

/// Builds the built-in action list.
///
/// `modules` reads the repository through a weak reference so the list does
/// not keep its own repository alive.
#[must_use]
pub fn system_actions(repository: Weak<ActionRepository>) -> ActionList {
    let mut list = ActionList::named("system");
    list.push_named("ping", |_, _, _| Ok("pong".to_owned()));
    list.push_named("modules", move |_, _, _| {
        let repository = repository
            .upgrade()
            .ok_or_else(|| ActionError::failed("action repository is shutting down"))?;
        Ok(repository
            .modules()
            .into_iter()
            .map(|(sid, module)| format!("{sid}:{module}\n"))
            .collect::<String>())
    });
    list.push_named("echo", |_, node, _| {
        node.children()
            .find(|child| child.has_tag_name("text"))
            .map(|child| child.text().unwrap_or_default().to_owned())
            .ok_or_else(|| {
                ActionError::warning("echo requires a <text> parameter")
                    .with_supplement("send <text>...</text> inside <command>")
            })
    });
    list
}

/// Registers the built-in actions in `repository`.
///
/// # Errors
///
/// Returns [`RepositoryError::BadModule`] if the repository has no slot for
/// [`SYSTEM_SUBSYSTEM`].
pub fn register_system_actions(repository: &Arc<ActionRepository>) -> Result<(), RepositoryError> {
    let list = system_actions(Arc::downgrade(repository));
    repository.register(SYSTEM_SUBSYSTEM, Arc::new(list))
}
