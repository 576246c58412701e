//! Modular namespaced state store
//!
//! A [`RootStore`] is assembled from [`ModuleDescriptor`]s. Each module owns
//! one state container that only its mutations may write; actions run
//! asynchronously and commit through an [`ActionContext`]; getters derive
//! values from a state snapshot and are memoized until the next commit.
//!
//! Data flows one way:
//!
//! ```text
//! StoreView::dispatch(action) -> ActionContext::commit(mutation) -> state -> getters
//! ```
//!
//! Members of a namespaced module are addressed as `<namespace>/<name>`.

mod context;
mod errors;
mod events;
mod module;
mod namespace;
mod policy;
mod root;
mod slot;

pub use context::ActionContext;
pub use errors::{ActionError, CompositionError, MemberKind, MutationError, StoreError};
pub use events::{ActionStatus, EventBroadcaster, StoreEvent};
pub use module::{to_json, Message, Module, ModuleDescriptor};
pub use namespace::{qualify, validate as validate_namespace};
pub use policy::ValidationPolicy;
pub use root::{ModuleHandle, RootState, RootStore, RootStoreBuilder, StoreView};
