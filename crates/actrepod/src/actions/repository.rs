//! Process-wide table of subsystem action lists.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use roxmltree::Node;
use tracing::{debug, info};

use super::errors::RepositoryError;
use super::{ACTIONS_TARGET, ActionContext, ActionList, ActionSource};

type Slots = Vec<Option<Arc<ActionList>>>;

/// Fixed-size table mapping subsystem ids to their action lists.
///
/// The repository does not own the lists; subsystems keep their own `Arc`
/// and may unregister at shutdown. Every access outside `[0, capacity)` or
/// to an empty slot is reported as [`RepositoryError::BadModule`].
///
/// The table sits behind a reader/writer lock. [`run_cmd`](Self::run_cmd)
/// clones the slot's `Arc` and releases the lock before invoking the
/// handler, so a long-running handler never holds up registration and an
/// unregistration racing with a dispatch lets that dispatch finish against
/// the list it already resolved.
#[derive(Debug, Default)]
pub struct ActionRepository {
    slots: RwLock<Slots>,
}

impl ActionRepository {
    /// Creates a repository with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(vec![None; capacity]),
        }
    }

    /// Replaces the table with `capacity` empty slots, dropping every
    /// registration.
    pub fn init(&self, capacity: usize) {
        *self.write() = vec![None; capacity];
        debug!(target: ACTIONS_TARGET, capacity, "action repository initialised");
    }

    /// Number of subsystem slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.read().len()
    }

    /// Stores `list` in slot `sid`, replacing any previous registration.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BadModule`] if `sid` is out of range.
    pub fn register(&self, sid: i64, list: Arc<ActionList>) -> Result<(), RepositoryError> {
        let mut slots = self.write();
        let capacity = slots.len();
        let slot = slot_mut(&mut slots, sid).ok_or(RepositoryError::bad_module(sid, capacity))?;
        info!(
            target: ACTIONS_TARGET,
            sid,
            module = list.module_name(),
            actions = list.len(),
            replaced = slot.is_some(),
            "action list registered"
        );
        *slot = Some(list);
        Ok(())
    }

    /// Clears slot `sid`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BadModule`] if `sid` is out of range.
    pub fn unregister(&self, sid: i64) -> Result<(), RepositoryError> {
        let mut slots = self.write();
        let capacity = slots.len();
        let slot = slot_mut(&mut slots, sid).ok_or(RepositoryError::bad_module(sid, capacity))?;
        if slot.take().is_some() {
            info!(target: ACTIONS_TARGET, sid, "action list unregistered");
        }
        Ok(())
    }

    /// Returns `true` when slot `sid` holds a list.
    #[must_use]
    pub fn is_registered(&self, sid: i64) -> bool {
        self.lookup(sid).is_ok()
    }

    /// Registered subsystem ids with their module names, in id order.
    #[must_use]
    pub fn modules(&self) -> Vec<(usize, String)> {
        self.read()
            .iter()
            .enumerate()
            .filter_map(|(sid, slot)| {
                slot.as_ref()
                    .map(|list| (sid, list.module_name().to_owned()))
            })
            .collect()
    }

    /// Runs command `cid` of subsystem `sid`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BadModule`] when `sid` is out of range or
    /// unregistered, and propagates [`RepositoryError::BadAction`] and
    /// handler failures from [`ActionList::run`].
    pub fn run_cmd(
        &self,
        sid: i64,
        cid: i64,
        source: ActionSource,
        node: Node<'_, '_>,
        context: &ActionContext,
    ) -> Result<String, RepositoryError> {
        let list = self.lookup(sid)?;
        list.run(cid, source, node, context)
    }

    fn lookup(&self, sid: i64) -> Result<Arc<ActionList>, RepositoryError> {
        let slots = self.read();
        usize::try_from(sid)
            .ok()
            .and_then(|index| slots.get(index))
            .and_then(Option::clone)
            .ok_or(RepositoryError::bad_module(sid, slots.len()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slots> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn slot_mut(slots: &mut Slots, sid: i64) -> Option<&mut Option<Arc<ActionList>>> {
    usize::try_from(sid)
        .ok()
        .and_then(|index| slots.get_mut(index))
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use roxmltree::Document;

    use super::*;

    const COMMAND: &str = "<command><sysid>2</sysid><cmdid>0</cmdid></command>";

    fn pong_list() -> Arc<ActionList> {
        let mut list = ActionList::named("pinger");
        list.push_named("ping", |_, _, _| Ok("pong".to_owned()));
        Arc::new(list)
    }

    #[fixture]
    fn repository() -> ActionRepository {
        let repository = ActionRepository::new(5);
        repository
            .register(2, pong_list())
            .expect("register subsystem 2");
        repository
    }

    fn run(repository: &ActionRepository, sid: i64, cid: i64) -> Result<String, RepositoryError> {
        let document = Document::parse(COMMAND).expect("parse command");
        repository.run_cmd(
            sid,
            cid,
            ActionSource::FireLoop,
            document.root_element(),
            &ActionContext::internal(),
        )
    }

    #[rstest]
    fn dispatches_to_registered_handler(repository: ActionRepository) {
        assert_eq!(run(&repository, 2, 0).expect("dispatch"), "pong");
    }

    #[rstest]
    #[case(99)]
    #[case(5)]
    #[case(-1)]
    #[case(0)]
    #[case(4)]
    fn unknown_or_unregistered_subsystems_are_bad_modules(
        repository: ActionRepository,
        #[case] sid: i64,
    ) {
        for cid in [0, 1, 42] {
            let error = run(&repository, sid, cid).expect_err("subsystem is unavailable");
            assert!(
                matches!(error, RepositoryError::BadModule { sid: reported, capacity: 5 } if reported == sid),
                "unexpected error {error:?}"
            );
        }
    }

    #[rstest]
    fn out_of_range_command_is_bad_action(repository: ActionRepository) {
        let error = run(&repository, 2, 1).expect_err("command 1 is undefined");
        assert!(matches!(error, RepositoryError::BadAction { cid: 1, len: 1, .. }));
    }

    #[rstest]
    fn unregister_clears_the_slot(repository: ActionRepository) {
        repository.register(1, pong_list()).expect("register 1");
        assert!(repository.is_registered(1));

        repository.unregister(1).expect("unregister 1");

        assert!(!repository.is_registered(1));
        assert!(matches!(
            run(&repository, 1, 0),
            Err(RepositoryError::BadModule { sid: 1, .. })
        ));
    }

    #[rstest]
    #[case(5)]
    #[case(-3)]
    fn register_and_unregister_check_bounds(repository: ActionRepository, #[case] sid: i64) {
        assert!(matches!(
            repository.register(sid, pong_list()),
            Err(RepositoryError::BadModule { .. })
        ));
        assert!(matches!(
            repository.unregister(sid),
            Err(RepositoryError::BadModule { .. })
        ));
    }

    #[rstest]
    fn last_registration_wins(repository: ActionRepository) {
        let mut replacement = ActionList::named("replacement");
        replacement.push(|_, _, _| Ok("replaced".to_owned()));
        repository
            .register(2, Arc::new(replacement))
            .expect("re-register 2");

        assert_eq!(run(&repository, 2, 0).expect("dispatch"), "replaced");
        assert_eq!(repository.modules(), vec![(2, "replacement".to_owned())]);
    }

    #[rstest]
    fn init_discards_registrations(repository: ActionRepository) {
        repository.init(8);
        assert_eq!(repository.capacity(), 8);
        assert!(!repository.is_registered(2));
        assert!(repository.modules().is_empty());
    }
}
