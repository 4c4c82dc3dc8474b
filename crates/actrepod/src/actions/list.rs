//! Ordered handler table owned by a single subsystem.

use std::fmt;

use roxmltree::Node;
use tracing::debug_span;

use super::errors::{ActionError, RepositoryError};
use super::{ACTIONS_TARGET, ActionContext, ActionSource};

/// Handler signature shared by every action.
///
/// A handler receives the caller's origin, the root element of the parsed
/// command document and the per-request context. It returns the text placed
/// in the response description.
pub type ActionFn = dyn for<'a, 'input> Fn(ActionSource, Node<'a, 'input>, &ActionContext) -> Result<String, ActionError>
    + Send
    + Sync;

struct ActionEntry {
    name: Option<String>,
    action: Box<ActionFn>,
}

/// Handlers published by one subsystem, indexed by command id.
///
/// The command id of a handler is its position in the list, so the order of
/// [`push`](Self::push) calls is the contract with callers. Lists are built
/// during subsystem start-up and are not modified once registered.
#[derive(Default)]
pub struct ActionList {
    module: String,
    actions: Vec<ActionEntry>,
}

impl ActionList {
    /// Creates an empty, unnamed list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list whose owner is named `module` in logs.
    #[must_use]
    pub fn named(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            actions: Vec::new(),
        }
    }

    /// Appends a handler and returns its command id.
    pub fn push<F>(&mut self, action: F) -> usize
    where
        F: Fn(ActionSource, Node<'_, '_>, &ActionContext) -> Result<String, ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(None, Box::new(action))
    }

    /// Appends a handler with a human-readable name used in logs.
    pub fn push_named<F>(&mut self, name: impl Into<String>, action: F) -> usize
    where
        F: Fn(ActionSource, Node<'_, '_>, &ActionContext) -> Result<String, ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(Some(name.into()), Box::new(action))
    }

    fn insert(&mut self, name: Option<String>, action: Box<ActionFn>) -> usize {
        self.actions.push(ActionEntry { name, action });
        self.actions.len() - 1
    }

    /// Module name of the owning subsystem; empty when unset.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Name of the action at `cid`; empty when unset or out of range.
    #[must_use]
    pub fn action_name(&self, cid: i64) -> &str {
        self.entry(cid)
            .and_then(|entry| entry.name.as_deref())
            .unwrap_or_default()
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` when no action has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs the action at `cid`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BadAction`] when `cid` is outside the list
    /// and [`RepositoryError::Handler`] when the handler fails. Handler
    /// errors keep their message and severity and gain the `action-list`
    /// trace marker.
    pub fn run(
        &self,
        cid: i64,
        source: ActionSource,
        node: Node<'_, '_>,
        context: &ActionContext,
    ) -> Result<String, RepositoryError> {
        let Some(entry) = self.entry(cid) else {
            return Err(RepositoryError::bad_action(
                self.module.as_str(),
                cid,
                self.len(),
            ));
        };

        let span = debug_span!(
            target: ACTIONS_TARGET,
            "action",
            module = self.module.as_str(),
            action = entry.name.as_deref().unwrap_or_default(),
            cid,
            %source,
        );
        let _entered = span.enter();
        (entry.action)(source, node, context)
            .map_err(|error| RepositoryError::Handler(error.traced("action-list")))
    }

    fn entry(&self, cid: i64) -> Option<&ActionEntry> {
        usize::try_from(cid)
            .ok()
            .and_then(|index| self.actions.get(index))
    }
}

impl fmt::Debug for ActionList {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .actions
            .iter()
            .map(|entry| entry.name.as_deref().unwrap_or_default())
            .collect();
        formatter
            .debug_struct("ActionList")
            .field("module", &self.module)
            .field("actions", &names)
            .finish()
    }
}
