//! What an action body sees of the store

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::Value;

use super::errors::{ActionError, StoreError};
use super::module::Module;
use super::root::{RootState, StoreInner};
use super::slot::ModuleSlot;

/// Handle passed to [`Module::run`].
///
/// `commit` and `dispatch` address the action's own module. Reaching another
/// namespace takes the explicit `*_root` variants with a full path.
/// Commits apply synchronously, in call order.
pub struct ActionContext<M: Module> {
    slot: Arc<ModuleSlot<M>>,
    store: Arc<StoreInner>,
    path: String,
    id: u64,
    commits: Arc<AtomicU32>,
}

impl<M: Module> ActionContext<M> {
    pub(crate) fn new(
        slot: Arc<ModuleSlot<M>>,
        store: Arc<StoreInner>,
        path: String,
        id: u64,
        commits: Arc<AtomicU32>,
    ) -> Self {
        Self {
            slot,
            store,
            path,
            id,
            commits,
        }
    }

    /// Fully qualified name of the running action
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Instance id of the running action, unique per store
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn namespace(&self) -> &str {
        self.slot.namespace()
    }

    /// Commit a mutation to this module
    pub fn commit(&self, mutation: M::Mutation) {
        if self.slot.commit(&self.store, mutation) {
            self.commits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Dispatch another action of this module and wait for it to settle
    pub async fn dispatch(&self, action: M::Action) -> Result<M::Outcome, ActionError> {
        self.slot.clone().dispatch(self.store.clone(), action).await
    }

    /// Snapshot of this module's state. Stale as soon as the action suspends.
    pub fn state(&self) -> M::State {
        self.slot.snapshot()
    }

    pub fn read<R>(&self, f: impl FnOnce(&M::State) -> R) -> R {
        self.slot.read(f)
    }

    /// Evaluate one of this module's getters
    pub fn get(&self, getter: &M::Getter) -> Result<Value, StoreError> {
        self.slot.get(&self.store, getter)
    }

    /// Every module's state, keyed by namespace
    pub fn root_state(&self) -> Result<RootState, StoreError> {
        self.store.root_state()
    }

    /// Evaluate any getter by fully qualified name
    pub fn root_get(&self, path: &str, args: Value) -> Result<Value, StoreError> {
        self.store.get_path(path, args)
    }

    /// Commit any mutation by fully qualified name
    pub fn commit_root(&self, path: &str, payload: Value) -> Result<(), StoreError> {
        if self.store.commit_path(path, payload)? {
            self.commits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Dispatch any action by fully qualified name
    pub async fn dispatch_root(&self, path: &str, payload: Value) -> Result<Value, ActionError> {
        StoreInner::dispatch_path(self.store.clone(), path, payload).await
    }
}
