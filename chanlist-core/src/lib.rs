//! Namespaced reactive state store for the channel list
//!
//! ```text
//! UI ── dispatch(action) ──▶ Action Registry ── commit(mutation) ──▶ Mutation Registry
//!  ▲                              │                                        │
//!  │                         ChannelApi (I/O)                              ▼
//!  └──────── getters ◀──────────────────────────────────────────── State Container
//! ```
//!
//! - [`core_store`]: root store, module descriptors, routing, subscriptions
//! - [`core_channel_list`]: the `channelList` module (state, getters, mutations, actions)
//! - [`core_backend`]: the backend the actions call into (in-memory and HTTP)

pub mod config;
pub mod core_backend;
pub mod core_channel_list;
pub mod core_store;
pub mod logging;
pub mod metrics;
pub mod trace;

#[cfg(test)]
pub(crate) mod test_utils;

pub use core_backend::{ChannelApi, HttpBackend, MemoryBackend};
pub use core_channel_list::{ChannelList, NAMESPACE as CHANNEL_LIST};
pub use core_store::{ModuleDescriptor, RootStore, StoreView};
pub use logging::{init_logging, LogLevel};
