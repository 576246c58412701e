//! The channel list store module
//!
//! Holds the channels visible to the user, their lazily fetched details,
//! pending collaboration invitations and the metadata of the current listing
//! page. Registered under [`NAMESPACE`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use chanlist_core::{ChannelList, MemoryBackend, RootStore, CHANNEL_LIST};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let store = RootStore::builder()
//!     .register(CHANNEL_LIST, ChannelList::descriptor(Arc::new(MemoryBackend::new())))?
//!     .build();
//! let view = store.view();
//! view.dispatch("channelList/loadChannelList", serde_json::json!({})).await?;
//! let channels = view.get("channelList/channels", serde_json::Value::Null)?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core_backend::ChannelApi;
use crate::core_store::{
    ActionContext, ActionError, Module, ModuleDescriptor, MutationError, RootState,
};

mod actions;
pub mod getters;
pub mod mutations;
mod state;
mod types;

pub use actions::{ChannelListAction, ChannelListOutcome};
pub use getters::ChannelListGetter;
pub use mutations::ChannelListMutation;
pub use state::ChannelListState;
pub use types::{
    CatalogPage, CatalogQuery, ChannelDetails, ChannelId, ChannelPatch, ChannelQuery,
    ChannelSummary, Invitation, InvitationId, KindCount, Page, SampleNode, ShareMode,
    DEFAULT_PAGE_SIZE,
};

/// Conventional namespace of the channel list module
pub const NAMESPACE: &str = "channelList";

#[derive(Clone)]
pub struct ChannelList {
    api: Arc<dyn ChannelApi>,
}

impl ChannelList {
    pub fn new(api: Arc<dyn ChannelApi>) -> Self {
        Self { api }
    }

    /// Namespaced descriptor ready for registration
    pub fn descriptor(api: Arc<dyn ChannelApi>) -> ModuleDescriptor<Self> {
        ModuleDescriptor::namespaced(Self::new(api))
    }

    pub fn api(&self) -> &Arc<dyn ChannelApi> {
        &self.api
    }
}

impl fmt::Debug for ChannelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelList").finish_non_exhaustive()
    }
}

#[async_trait]
impl Module for ChannelList {
    type State = ChannelListState;
    type Getter = ChannelListGetter;
    type Mutation = ChannelListMutation;
    type Action = ChannelListAction;
    type Outcome = ChannelListOutcome;

    fn create_state(&self) -> ChannelListState {
        ChannelListState::new()
    }

    fn get(state: &ChannelListState, _root: &RootState, getter: &ChannelListGetter) -> Value {
        getters::evaluate(state, getter)
    }

    fn apply(
        state: &mut ChannelListState,
        mutation: ChannelListMutation,
    ) -> Result<(), MutationError> {
        mutations::apply(state, mutation)
    }

    async fn run(
        &self,
        ctx: ActionContext<Self>,
        action: ChannelListAction,
    ) -> Result<ChannelListOutcome, ActionError> {
        actions::run(self.api.as_ref(), ctx, action).await
    }
}
