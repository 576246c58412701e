//! Channel backend
//!
//! Actions reach the server only through [`ChannelApi`]. Two implementations
//! ship with the crate: an in-process [`MemoryBackend`] for tests, demos and
//! offline use, and an [`HttpBackend`] speaking the Studio REST endpoints.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{BackendConfig, BackendKind};
use crate::core_channel_list::{
    CatalogPage, CatalogQuery, ChannelDetails, ChannelId, ChannelQuery, ChannelSummary,
    Invitation, InvitationId,
};

mod error;
mod http;
mod memory;

pub use error::BackendError;
pub use http::HttpBackend;
pub use memory::{ApiOperation, Fixture, MemoryBackend};

/// Server operations used by the channel list actions
#[async_trait]
pub trait ChannelApi: Send + Sync {
    async fn fetch_channel(&self, id: &ChannelId) -> Result<ChannelSummary, BackendError>;

    async fn list_channels(&self, query: &ChannelQuery)
        -> Result<Vec<ChannelSummary>, BackendError>;

    /// Public catalog search, one page at a time
    async fn search_catalog(&self, query: &CatalogQuery) -> Result<CatalogPage, BackendError>;

    async fn fetch_channel_details(&self, id: &ChannelId) -> Result<ChannelDetails, BackendError>;

    /// Invitations addressed to the current user
    async fn list_invitations(&self) -> Result<Vec<Invitation>, BackendError>;

    /// Returns the invitation as accepted
    async fn accept_invitation(&self, id: &InvitationId) -> Result<Invitation, BackendError>;

    async fn decline_invitation(&self, id: &InvitationId) -> Result<(), BackendError>;

    /// Request a CSV export of matching channels. The file is delivered
    /// out of band.
    async fn export_channels_csv(&self, query: &ChannelQuery) -> Result<(), BackendError>;
}

/// Build the backend selected by `config`
pub fn from_config(config: &BackendConfig) -> Result<Arc<dyn ChannelApi>, BackendError> {
    match config.kind {
        BackendKind::Memory => {
            let backend = match &config.fixture {
                Some(path) => MemoryBackend::from_fixture_file(path)?,
                None => MemoryBackend::new(),
            };
            Ok(Arc::new(backend.with_latency(config.latency)))
        }
        BackendKind::Http => Ok(Arc::new(HttpBackend::from_config(config)?)),
    }
}
