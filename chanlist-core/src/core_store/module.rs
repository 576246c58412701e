//! Module contract and descriptor
//!
//! A module is one namespaced unit of the root store: a state factory plus
//! three closed registries (getters, mutations, actions), each expressed as a
//! serde enum so that the store can route by name while the module matches
//! exhaustively on its own commands.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::context::ActionContext;
use super::errors::{ActionError, MutationError};
use super::root::RootState;

/// One member of a closed registry enum.
///
/// Implementors are serde enums tagged as
/// `#[serde(tag = "type", content = "payload")]`, so that a routing name plus
/// a JSON payload is enough to rebuild the value.
pub trait Message: Serialize + DeserializeOwned + Debug + Send + Sync + 'static {
    /// Routing names of every variant
    const NAMES: &'static [&'static str];

    /// Routing name of this value's variant
    fn name(&self) -> &'static str;

    /// Rebuild a message from its routing name and payload.
    /// A `null` payload selects a variant without data.
    fn from_parts(name: &str, payload: Value) -> Result<Self, serde_json::Error> {
        let mut envelope = serde_json::Map::new();
        envelope.insert("type".to_string(), Value::String(name.to_string()));
        if !payload.is_null() {
            envelope.insert("payload".to_string(), payload);
        }
        serde_json::from_value(Value::Object(envelope))
    }
}

/// A store module: state shape plus its getter, mutation and action registries
#[async_trait]
pub trait Module: Send + Sync + Sized + 'static {
    /// The module's state container
    type State: Clone + Debug + Serialize + Send + Sync + 'static;
    type Getter: Message;
    type Mutation: Message;
    type Action: Message;
    /// Result of a successful action
    type Outcome: Serialize + Debug + Send + 'static;

    /// Whether `get` reads its `root` argument. When false, getters receive
    /// an empty [`RootState`] and no cross-module snapshot is built.
    const READS_ROOT: bool = false;

    /// Produce a fresh state container. Called once per store instantiation.
    fn create_state(&self) -> Self::State;

    /// Evaluate a getter. Must be pure and must not panic for any reachable
    /// state; absent keys evaluate to `null`.
    fn get(state: &Self::State, root: &RootState, getter: &Self::Getter) -> Value;

    /// Apply a mutation. Validate the payload before touching `state`: an
    /// `Err` must leave the state exactly as it was.
    fn apply(state: &mut Self::State, mutation: Self::Mutation) -> Result<(), MutationError>;

    /// Run an action to completion, committing through `ctx`
    async fn run(
        &self,
        ctx: ActionContext<Self>,
        action: Self::Action,
    ) -> Result<Self::Outcome, ActionError>;
}

/// Composition record handed to the root store.
///
/// Immutable once registered; registering it runs the state factory.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor<M: Module> {
    namespaced: bool,
    module: M,
}

impl<M: Module> ModuleDescriptor<M> {
    /// Members are addressed as `<namespace>/<name>`
    pub fn namespaced(module: M) -> Self {
        Self {
            namespaced: true,
            module,
        }
    }

    /// Members are addressed by bare name in the root scope
    pub fn global(module: M) -> Self {
        Self {
            namespaced: false,
            module,
        }
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn getters(&self) -> &'static [&'static str] {
        M::Getter::NAMES
    }

    pub fn mutations(&self) -> &'static [&'static str] {
        M::Mutation::NAMES
    }

    pub fn actions(&self) -> &'static [&'static str] {
        M::Action::NAMES
    }

    pub(crate) fn into_module(self) -> M {
        self.module
    }
}

/// Serialize a getter result; getters never fail, so an unserializable value
/// becomes `null`.
pub fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
