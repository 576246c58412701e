//! Root store: assembly, routing and subscription

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::errors::{ActionError, CompositionError, MemberKind, MutationError, StoreError};
use super::events::{ActionStatus, EventBroadcaster, StoreEvent};
use super::module::{Module, ModuleDescriptor};
use super::namespace;
use super::policy::ValidationPolicy;
use super::slot::{ErasedSlot, ModuleSlot};
use crate::config::StoreConfig;
use crate::metrics::{self, MetricsCollector, StoreStats};

/// Read-only snapshot of every module's state, keyed by namespace
#[derive(Debug, Clone, PartialEq)]
pub struct RootState(Arc<Value>);

impl RootState {
    pub fn empty() -> Self {
        RootState(Arc::new(Value::Object(serde_json::Map::new())))
    }

    /// State of the module registered under `namespace`
    pub fn module(&self, namespace: &str) -> Option<&Value> {
        self.0.get(namespace)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Route {
    slot: usize,
    name: &'static str,
}

pub(crate) struct StoreInner {
    slots: Vec<Arc<dyn ErasedSlot>>,
    namespaces: HashMap<String, usize>,
    routes: HashMap<(MemberKind, String), Route>,
    version: AtomicU64,
    action_ids: AtomicU64,
    events: EventBroadcaster,
    policy: ValidationPolicy,
    cache_capacity: usize,
    root_cache: Mutex<Option<(u64, RootState)>>,
    metrics: MetricsCollector,
}

impl StoreInner {
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    pub(crate) fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub(crate) fn next_action_id(&self) -> u64 {
        self.action_ids.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn committed(&self, path: String) {
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        self.metrics.inc_commits();
        metrics::record_commit(&path);
        debug!(mutation = %path, version, "committed");
        self.events.emit(StoreEvent::Committed { path, version });
    }

    pub(crate) fn rejected(&self, path: &str, error: &MutationError) {
        self.metrics.inc_rejected();
        metrics::record_rejected(path);
        self.policy.reject(path, error);
    }

    pub(crate) fn action_started(&self, path: &str, id: u64) {
        self.metrics.inc_actions_dispatched();
        self.events.emit(StoreEvent::ActionStarted {
            path: path.to_string(),
            id,
        });
    }

    pub(crate) fn action_settled(&self, path: &str, id: u64, succeeded: bool, commits: u32) {
        let status = if succeeded {
            ActionStatus::Succeeded
        } else {
            self.metrics.inc_actions_failed();
            ActionStatus::Failed
        };
        self.events.emit(StoreEvent::ActionSettled {
            path: path.to_string(),
            id,
            status,
            commits,
        });
    }

    /// Snapshot of all module states, rebuilt at most once per version
    pub(crate) fn root_state(&self) -> Result<RootState, StoreError> {
        let version = self.version();
        if let Some((cached_at, root)) = self.root_cache.lock().as_ref() {
            if *cached_at == version {
                return Ok(root.clone());
            }
        }

        let mut map = serde_json::Map::new();
        for slot in &self.slots {
            map.insert(slot.namespace().to_string(), slot.state_json()?);
        }
        let root = RootState(Arc::new(Value::Object(map)));
        *self.root_cache.lock() = Some((version, root.clone()));
        Ok(root)
    }

    pub(crate) fn route(
        &self,
        kind: MemberKind,
        path: &str,
    ) -> Result<(Arc<dyn ErasedSlot>, &'static str), StoreError> {
        let route = self
            .routes
            .get(&(kind, path.to_string()))
            .ok_or_else(|| StoreError::unknown(kind, path))?;
        Ok((self.slots[route.slot].clone(), route.name))
    }

    /// `Ok(false)` when the payload was rejected under the lenient policy
    pub(crate) fn commit_path(&self, path: &str, payload: Value) -> Result<bool, StoreError> {
        let (slot, name) = self.route(MemberKind::Mutation, path)?;
        slot.commit_named(self, name, payload)
    }

    pub(crate) fn get_path(&self, path: &str, args: Value) -> Result<Value, StoreError> {
        let (slot, name) = self.route(MemberKind::Getter, path)?;
        slot.get_named(self, name, args)
    }

    pub(crate) async fn dispatch_path(
        store: Arc<StoreInner>,
        path: &str,
        payload: Value,
    ) -> Result<Value, ActionError> {
        let (slot, name) = store.route(MemberKind::Action, path)?;
        slot.dispatch_named(store.clone(), name.to_string(), payload)
            .await
    }

    fn slot<M: Module>(&self, namespace: &str) -> Result<Arc<ModuleSlot<M>>, StoreError> {
        let index = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| StoreError::UnknownNamespace(namespace.to_string()))?;
        self.slots[*index]
            .clone()
            .into_any()
            .downcast::<ModuleSlot<M>>()
            .map_err(|_| StoreError::ModuleTypeMismatch {
                namespace: namespace.to_string(),
            })
    }
}

/// Assembles modules into a [`RootStore`]
pub struct RootStoreBuilder {
    slots: Vec<Arc<dyn ErasedSlot>>,
    namespaces: HashMap<String, usize>,
    routes: HashMap<(MemberKind, String), Route>,
    policy: ValidationPolicy,
    event_buffer: usize,
    cache_capacity: usize,
}

impl RootStoreBuilder {
    fn new() -> Self {
        let defaults = StoreConfig::default();
        Self {
            slots: Vec::new(),
            namespaces: HashMap::new(),
            routes: HashMap::new(),
            policy: ValidationPolicy::from_flag(defaults.strict_mutations),
            event_buffer: defaults.event_buffer,
            cache_capacity: defaults.getter_cache_capacity,
        }
    }

    /// Apply the `[store]` configuration section
    pub fn with_config(mut self, config: &StoreConfig) -> Self {
        self.policy = ValidationPolicy::from_flag(config.strict_mutations);
        self.event_buffer = config.event_buffer;
        self.cache_capacity = config.getter_cache_capacity;
        self
    }

    pub fn policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    pub fn getter_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Register a module under `namespace`, running its state factory.
    ///
    /// Fails if the namespace is malformed or taken, or if any member name
    /// collides with one already registered in the same scope.
    pub fn register<M: Module>(
        mut self,
        namespace: &str,
        descriptor: ModuleDescriptor<M>,
    ) -> Result<Self, CompositionError> {
        namespace::validate(namespace)?;
        if self.namespaces.contains_key(namespace) {
            return Err(CompositionError::DuplicateNamespace(namespace.to_string()));
        }

        let index = self.slots.len();
        let namespaced = descriptor.is_namespaced();
        let registries = [
            (MemberKind::Getter, descriptor.getters()),
            (MemberKind::Mutation, descriptor.mutations()),
            (MemberKind::Action, descriptor.actions()),
        ];
        for (kind, names) in registries {
            for name in names {
                let path = namespace::qualify(namespace, namespaced, name);
                if self.routes.contains_key(&(kind, path.clone())) {
                    return Err(CompositionError::DuplicateMember { kind, path });
                }
                self.routes
                    .insert((kind, path), Route { slot: index, name });
            }
        }

        let slot = ModuleSlot::new(namespace.to_string(), descriptor);
        info!(namespace, namespaced, "registered store module");
        self.slots.push(Arc::new(slot));
        self.namespaces.insert(namespace.to_string(), index);
        Ok(self)
    }

    pub fn build(self) -> RootStore {
        RootStore {
            inner: Arc::new(StoreInner {
                slots: self.slots,
                namespaces: self.namespaces,
                routes: self.routes,
                version: AtomicU64::new(0),
                action_ids: AtomicU64::new(0),
                events: EventBroadcaster::new(self.event_buffer),
                policy: self.policy,
                cache_capacity: self.cache_capacity,
                root_cache: Mutex::new(None),
                metrics: MetricsCollector::new(),
            }),
        }
    }
}

/// The assembled store. Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct RootStore {
    inner: Arc<StoreInner>,
}

impl RootStore {
    pub fn builder() -> RootStoreBuilder {
        RootStoreBuilder::new()
    }

    /// Namespaces in registration order
    pub fn namespaces(&self) -> Vec<&str> {
        self.inner.slots.iter().map(|slot| slot.namespace()).collect()
    }

    /// Typed handle to the module registered under `namespace`
    pub fn module<M: Module>(&self, namespace: &str) -> Result<ModuleHandle<M>, StoreError> {
        Ok(ModuleHandle {
            slot: self.inner.slot::<M>(namespace)?,
            store: self.inner.clone(),
        })
    }

    /// Commit a mutation by fully qualified name.
    ///
    /// Meant for the composition root and tests; the UI goes through
    /// [`StoreView`], which cannot commit.
    pub fn commit(&self, path: &str, payload: Value) -> Result<(), StoreError> {
        self.inner.commit_path(path, payload).map(|_| ())
    }

    /// Evaluate a getter by fully qualified name
    pub fn get(&self, path: &str, args: Value) -> Result<Value, StoreError> {
        self.inner.get_path(path, args)
    }

    /// Dispatch an action by fully qualified name and wait for it to settle
    pub async fn dispatch(&self, path: &str, payload: Value) -> Result<Value, ActionError> {
        StoreInner::dispatch_path(self.inner.clone(), path, payload).await
    }

    pub fn state(&self) -> Result<RootState, StoreError> {
        self.inner.root_state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Number of mutations applied so far
    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.inner.policy
    }

    pub fn stats(&self) -> StoreStats {
        self.inner.metrics.snapshot()
    }

    /// The UI-facing surface of this store
    pub fn view(&self) -> StoreView {
        StoreView {
            store: self.clone(),
        }
    }
}

/// UI-facing store surface: read through getters, write through actions
#[derive(Clone)]
pub struct StoreView {
    store: RootStore,
}

impl StoreView {
    pub fn get(&self, path: &str, args: Value) -> Result<Value, StoreError> {
        self.store.get(path, args)
    }

    pub async fn dispatch(&self, path: &str, payload: Value) -> Result<Value, ActionError> {
        self.store.dispatch(path, payload).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    pub fn version(&self) -> u64 {
        self.store.version()
    }
}

/// Typed access to one registered module
pub struct ModuleHandle<M: Module> {
    slot: Arc<ModuleSlot<M>>,
    store: Arc<StoreInner>,
}

impl<M: Module> Clone for ModuleHandle<M> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            store: self.store.clone(),
        }
    }
}

impl<M: Module> ModuleHandle<M> {
    pub fn namespace(&self) -> &str {
        self.slot.namespace()
    }

    /// Snapshot of the module's state
    pub fn state(&self) -> M::State {
        self.slot.snapshot()
    }

    /// Run `f` against the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&M::State) -> R) -> R {
        self.slot.read(f)
    }

    pub fn commit(&self, mutation: M::Mutation) {
        self.slot.commit(&self.store, mutation);
    }

    /// Memoized getter evaluation
    pub fn get(&self, getter: &M::Getter) -> Result<Value, StoreError> {
        self.slot.get(&self.store, getter)
    }

    pub fn get_as<T: DeserializeOwned>(&self, getter: &M::Getter) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.get(getter)?)?)
    }

    pub async fn dispatch(&self, action: M::Action) -> Result<M::Outcome, ActionError> {
        self.slot.clone().dispatch(self.store.clone(), action).await
    }
}
