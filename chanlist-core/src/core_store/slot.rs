//! A registered module instance
//!
//! The slot owns the module's state container. Writes take the lock for the
//! duration of one `apply`, reads for one getter evaluation; the lock is
//! never held across an `.await`.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{error, Instrument};

use super::context::ActionContext;
use super::errors::{ActionError, MutationError, StoreError};
use super::module::{Message, Module, ModuleDescriptor};
use super::namespace;
use super::root::{RootState, StoreInner};
use crate::trace::ActionTrace;

pub(crate) struct ModuleSlot<M: Module> {
    namespace: String,
    namespaced: bool,
    module: Arc<M>,
    state: RwLock<M::State>,
    getter_cache: Mutex<HashMap<String, (u64, Value)>>,
}

impl<M: Module> ModuleSlot<M> {
    pub(crate) fn new(namespace: String, descriptor: ModuleDescriptor<M>) -> Self {
        let namespaced = descriptor.is_namespaced();
        let module = descriptor.into_module();
        let state = module.create_state();

        Self {
            namespace,
            namespaced,
            module: Arc::new(module),
            state: RwLock::new(state),
            getter_cache: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn namespace(&self) -> &str {
        &self.namespace
    }

    pub(crate) fn qualify(&self, name: &str) -> String {
        namespace::qualify(&self.namespace, self.namespaced, name)
    }

    pub(crate) fn snapshot(&self) -> M::State {
        self.state.read().clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&M::State) -> R) -> R {
        f(&self.state.read())
    }

    /// Apply one mutation synchronously; `false` if it was rejected
    pub(crate) fn commit(&self, store: &StoreInner, mutation: M::Mutation) -> bool {
        let path = self.qualify(mutation.name());
        let result = {
            let mut state = self.state.write();
            M::apply(&mut state, mutation)
        };

        match result {
            Ok(()) => {
                store.committed(path);
                true
            }
            Err(error) => {
                store.rejected(&path, &error);
                false
            }
        }
    }

    /// Evaluate a getter, memoized until the next commit anywhere in the store
    pub(crate) fn get(&self, store: &StoreInner, getter: &M::Getter) -> Result<Value, StoreError> {
        let key = serde_json::to_string(getter)?;
        let version = store.version();

        if let Some((cached_at, value)) = self.getter_cache.lock().get(&key) {
            if *cached_at == version {
                store.metrics().inc_cache_hits();
                return Ok(value.clone());
            }
        }

        let root = if M::READS_ROOT {
            store.root_state()?
        } else {
            RootState::empty()
        };
        let value = {
            let state = self.state.read();
            M::get(&state, &root, getter)
        };

        let capacity = store.cache_capacity();
        if capacity > 0 {
            let mut cache = self.getter_cache.lock();
            if cache.len() >= capacity && !cache.contains_key(&key) {
                cache.clear();
            }
            cache.insert(key, (version, value.clone()));
        }

        Ok(value)
    }

    /// Run an action on its own task.
    ///
    /// Dropping the returned future does not cancel the action: it still runs
    /// to completion and still commits. Every started action settles; a
    /// panicking one settles as failed before the panic resumes here.
    pub(crate) async fn dispatch(
        self: Arc<Self>,
        store: Arc<StoreInner>,
        action: M::Action,
    ) -> Result<M::Outcome, ActionError> {
        let path = self.qualify(action.name());
        let id = store.next_action_id();
        let commits = Arc::new(AtomicU32::new(0));
        store.action_started(&path, id);

        let task = tokio::spawn(run_action(
            self,
            store.clone(),
            path.clone(),
            id,
            action,
            commits.clone(),
        ));
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                store.action_settled(&path, id, false, commits.load(Ordering::Relaxed));
                Err(ActionError::Aborted(err.to_string()))
            }
        }
    }
}

async fn run_action<M: Module>(
    slot: Arc<ModuleSlot<M>>,
    store: Arc<StoreInner>,
    path: String,
    id: u64,
    action: M::Action,
    commits: Arc<AtomicU32>,
) -> Result<M::Outcome, ActionError> {
    let trace = ActionTrace::start(&path, id);
    let span = trace.span().clone();

    let module = slot.module.clone();
    let ctx = ActionContext::new(slot, store.clone(), path.clone(), id, commits.clone());

    let caught = AssertUnwindSafe(module.run(ctx, action).instrument(span))
        .catch_unwind()
        .await;

    let committed = commits.load(Ordering::Relaxed);
    let result = match caught {
        Ok(result) => result,
        Err(panic) => {
            error!(action = %path, id, commits = committed, "action panicked");
            store.action_settled(&path, id, false, committed);
            std::panic::resume_unwind(panic);
        }
    };
    match &result {
        Ok(_) => trace.succeeded(committed),
        Err(err) => trace.failed(err, committed),
    }
    store.action_settled(&path, id, result.is_ok(), committed);

    result
}

/// Type-erased view of a slot used for name-based routing
pub(crate) trait ErasedSlot: Send + Sync {
    fn namespace(&self) -> &str;

    fn state_json(&self) -> Result<Value, StoreError>;

    /// `Ok(false)` when the payload was rejected under the lenient policy
    fn commit_named(&self, store: &StoreInner, name: &str, payload: Value)
        -> Result<bool, StoreError>;

    fn get_named(&self, store: &StoreInner, name: &str, args: Value) -> Result<Value, StoreError>;

    fn dispatch_named(
        self: Arc<Self>,
        store: Arc<StoreInner>,
        name: String,
        payload: Value,
    ) -> BoxFuture<'static, Result<Value, ActionError>>;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<M: Module> ErasedSlot for ModuleSlot<M> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn state_json(&self) -> Result<Value, StoreError> {
        let state = self.state.read();
        Ok(serde_json::to_value(&*state)?)
    }

    fn commit_named(
        &self,
        store: &StoreInner,
        name: &str,
        payload: Value,
    ) -> Result<bool, StoreError> {
        match M::Mutation::from_parts(name, payload) {
            Ok(mutation) => Ok(self.commit(store, mutation)),
            Err(err) => {
                store.rejected(&self.qualify(name), &MutationError::Malformed(err.to_string()));
                Ok(false)
            }
        }
    }

    fn get_named(&self, store: &StoreInner, name: &str, args: Value) -> Result<Value, StoreError> {
        let getter = M::Getter::from_parts(name, args).map_err(|err| {
            StoreError::InvalidGetterArgs {
                path: self.qualify(name),
                reason: err.to_string(),
            }
        })?;
        self.get(store, &getter)
    }

    fn dispatch_named(
        self: Arc<Self>,
        store: Arc<StoreInner>,
        name: String,
        payload: Value,
    ) -> BoxFuture<'static, Result<Value, ActionError>> {
        Box::pin(async move {
            let action = M::Action::from_parts(&name, payload)
                .map_err(|err| ActionError::invalid_payload(self.qualify(&name), err.to_string()))?;
            let outcome = self.dispatch(store, action).await?;
            Ok(serde_json::to_value(outcome).map_err(StoreError::from)?)
        })
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
