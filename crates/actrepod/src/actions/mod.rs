//! Action registry: subsystem action lists and the repository routing
//! commands to them.
//!
//! Each subsystem builds an [`ActionList`] at start-up, pushing one handler
//! per command in command-id order, and registers it with the shared
//! [`ActionRepository`] under its subsystem id. Callers, the socket front
//! door included, invoke commands through
//! [`ActionRepository::run_cmd`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use actrepod::actions::{ActionContext, ActionList, ActionRepository, ActionSource};
//!
//! let repository = ActionRepository::new(4);
//! let mut list = ActionList::named("greeter");
//! list.push_named("hello", |_, _, _| Ok("hello".to_owned()));
//! repository.register(3, Arc::new(list)).expect("slot 3 exists");
//!
//! let document = roxmltree::Document::parse("<command/>").expect("valid xml");
//! let reply = repository
//!     .run_cmd(3, 0, ActionSource::TaskManager, document.root_element(), &ActionContext::internal())
//!     .expect("command runs");
//! assert_eq!(reply, "hello");
//! ```

mod errors;
mod list;
mod repository;
pub mod system;

use std::fmt;

use crate::transport::Peer;

pub use self::errors::{ActionError, RepositoryError, Severity};
pub use self::list::{ActionFn, ActionList};
pub use self::repository::ActionRepository;

pub(crate) const ACTIONS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::actions");

/// Origin of a command.
///
/// Every call carries exactly one origin; the values are not combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSource {
    /// The socket front door used by operators and tools.
    FireLoop,
    /// The node manager subsystem.
    NodeManager,
    /// The task manager subsystem.
    TaskManager,
}

impl ActionSource {
    /// Canonical name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FireLoop => "fireloop",
            Self::NodeManager => "node-manager",
            Self::TaskManager => "task-manager",
        }
    }
}

impl fmt::Display for ActionSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Per-request data handed to every handler alongside the command document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionContext {
    token: String,
    peer: Option<Peer>,
}

impl ActionContext {
    /// Context for calls made from inside the process.
    #[must_use]
    pub fn internal() -> Self {
        Self::default()
    }

    /// Context for a command received over a socket connection.
    pub fn remote(token: impl Into<String>, peer: Peer) -> Self {
        Self {
            token: token.into(),
            peer: Some(peer),
        }
    }

    /// Correlation token supplied by the caller; empty when none was sent.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Remote peer, if the command arrived over a socket.
    #[must_use]
    pub const fn peer(&self) -> Option<&Peer> {
        self.peer.as_ref()
    }
}
