//! In-process backend

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BackendError, ChannelApi};
use crate::core_channel_list::{
    CatalogPage, CatalogQuery, ChannelDetails, ChannelId, ChannelQuery, ChannelSummary,
    Invitation, InvitationId, ShareMode,
};

/// Backend calls, for failure injection and call accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    FetchChannel,
    ListChannels,
    SearchCatalog,
    FetchChannelDetails,
    ListInvitations,
    AcceptInvitation,
    DeclineInvitation,
    ExportChannelsCsv,
}

/// Seed data, as read from a JSON fixture file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fixture {
    pub channels: Vec<ChannelSummary>,
    pub details: Vec<ChannelDetails>,
    pub invitations: Vec<Invitation>,
}

#[derive(Debug, Default)]
struct Records {
    channels: BTreeMap<ChannelId, ChannelSummary>,
    details: BTreeMap<ChannelId, ChannelDetails>,
    invitations: BTreeMap<InvitationId, Invitation>,
    exports: Vec<ChannelQuery>,
}

/// Backend holding its records in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<Records>,
    latency: Duration,
    failures: Mutex<HashMap<ApiOperation, BackendError>>,
    calls: Mutex<HashMap<ApiOperation, usize>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let backend = Self::new();
        {
            let mut records = backend.records.write();
            for channel in fixture.channels {
                records.channels.insert(channel.id.clone(), channel);
            }
            for details in fixture.details {
                records.details.insert(details.id().clone(), details);
            }
            for invitation in fixture.invitations {
                records.invitations.insert(invitation.id.clone(), invitation);
            }
        }
        backend
    }

    pub fn from_fixture_file(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BackendError::Config(format!("{}: {}", path.display(), e)))?;
        let fixture: Fixture = serde_json::from_str(&contents)
            .map_err(|e| BackendError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_fixture(fixture))
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn insert_channel(&self, channel: ChannelSummary) {
        self.records
            .write()
            .channels
            .insert(channel.id.clone(), channel);
    }

    pub fn insert_details(&self, details: ChannelDetails) {
        self.records
            .write()
            .details
            .insert(details.id().clone(), details);
    }

    pub fn insert_invitation(&self, invitation: Invitation) {
        self.records
            .write()
            .invitations
            .insert(invitation.id.clone(), invitation);
    }

    /// Make the next call to `operation` fail with `error`
    pub fn fail_next(&self, operation: ApiOperation, error: BackendError) {
        self.failures.lock().insert(operation, error);
    }

    /// Calls made to `operation` so far, including failed ones
    pub fn calls(&self, operation: ApiOperation) -> usize {
        self.calls.lock().get(&operation).copied().unwrap_or(0)
    }

    /// Export requests received so far
    pub fn exports(&self) -> Vec<ChannelQuery> {
        self.records.read().exports.clone()
    }

    async fn enter(&self, operation: ApiOperation) -> Result<(), BackendError> {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.failures.lock().remove(&operation) {
            Some(error) => {
                debug!(?operation, %error, "injected backend failure");
                Err(error)
            }
            None => Ok(()),
        }
    }
}

fn by_name(a: &ChannelSummary, b: &ChannelSummary) -> std::cmp::Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ChannelApi for MemoryBackend {
    async fn fetch_channel(&self, id: &ChannelId) -> Result<ChannelSummary, BackendError> {
        self.enter(ApiOperation::FetchChannel).await?;
        self.records
            .read()
            .channels
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("channel", id))
    }

    async fn list_channels(
        &self,
        query: &ChannelQuery,
    ) -> Result<Vec<ChannelSummary>, BackendError> {
        self.enter(ApiOperation::ListChannels).await?;
        let mut channels: Vec<ChannelSummary> = self
            .records
            .read()
            .channels
            .values()
            .filter(|channel| query.matches(channel))
            .cloned()
            .collect();
        channels.sort_by(by_name);
        Ok(channels)
    }

    async fn search_catalog(&self, query: &CatalogQuery) -> Result<CatalogPage, BackendError> {
        self.enter(ApiOperation::SearchCatalog).await?;
        if query.page == 0 || query.page_size == 0 {
            return Err(BackendError::Api {
                status: 400,
                message: "page and page_size must be positive".to_string(),
            });
        }

        let mut matches: Vec<ChannelSummary> = self
            .records
            .read()
            .channels
            .values()
            .filter(|channel| channel.public && !channel.deleted)
            .filter(|channel| {
                query
                    .keywords
                    .as_deref()
                    .map_or(true, |k| channel.matches_keywords(k))
            })
            .filter(|channel| {
                query
                    .language
                    .as_deref()
                    .map_or(true, |lang| channel.language.as_deref() == Some(lang))
            })
            .cloned()
            .collect();
        matches.sort_by(by_name);

        let count = matches.len() as u64;
        let skip = (query.page as usize - 1).saturating_mul(query.page_size as usize);
        let results = matches
            .into_iter()
            .skip(skip)
            .take(query.page_size as usize)
            .collect();

        Ok(CatalogPage {
            page: query.page,
            page_size: query.page_size,
            count,
            results,
        })
    }

    async fn fetch_channel_details(&self, id: &ChannelId) -> Result<ChannelDetails, BackendError> {
        self.enter(ApiOperation::FetchChannelDetails).await?;
        let records = self.records.read();
        if let Some(details) = records.details.get(id) {
            return Ok(details.clone());
        }
        records
            .channels
            .get(id)
            .map(|channel| ChannelDetails::from_summary(channel.clone()))
            .ok_or_else(|| BackendError::not_found("channel", id))
    }

    async fn list_invitations(&self) -> Result<Vec<Invitation>, BackendError> {
        self.enter(ApiOperation::ListInvitations).await?;
        Ok(self
            .records
            .read()
            .invitations
            .values()
            .filter(|invitation| invitation.is_pending())
            .cloned()
            .collect())
    }

    async fn accept_invitation(&self, id: &InvitationId) -> Result<Invitation, BackendError> {
        self.enter(ApiOperation::AcceptInvitation).await?;
        let mut records = self.records.write();
        let invitation = records
            .invitations
            .get_mut(id)
            .ok_or_else(|| BackendError::not_found("invitation", id))?;
        if invitation.declined {
            return Err(BackendError::Api {
                status: 400,
                message: format!("invitation `{}` was declined", id),
            });
        }
        invitation.accepted = true;
        let accepted = invitation.clone();

        // Accepting grants the invited access on the channel
        if let Some(channel) = records.channels.get_mut(&accepted.channel_id) {
            match accepted.share_mode {
                ShareMode::Edit => channel.edit = true,
                ShareMode::View => channel.view = true,
            }
        }
        Ok(accepted)
    }

    async fn decline_invitation(&self, id: &InvitationId) -> Result<(), BackendError> {
        self.enter(ApiOperation::DeclineInvitation).await?;
        let mut records = self.records.write();
        let invitation = records
            .invitations
            .get_mut(id)
            .ok_or_else(|| BackendError::not_found("invitation", id))?;
        invitation.declined = true;
        Ok(())
    }

    async fn export_channels_csv(&self, query: &ChannelQuery) -> Result<(), BackendError> {
        self.enter(ApiOperation::ExportChannelsCsv).await?;
        self.records.write().exports.push(query.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{catalog_fixture, channel, invitation};

    fn search(keywords: Option<&str>, page: u32, page_size: u32) -> CatalogQuery {
        CatalogQuery {
            keywords: keywords.map(str::to_string),
            language: None,
            page,
            page_size,
        }
    }

    #[tokio::test]
    async fn test_fetch_channel() {
        let backend = MemoryBackend::new();
        backend.insert_channel(channel("c1", "Math"));

        assert_eq!(
            backend.fetch_channel(&"c1".into()).await.unwrap().name,
            "Math"
        );
        assert_eq!(
            backend.fetch_channel(&"c2".into()).await,
            Err(BackendError::not_found("channel", "c2"))
        );
        assert_eq!(backend.calls(ApiOperation::FetchChannel), 2);
    }

    #[tokio::test]
    async fn test_failure_injection_is_one_shot() {
        let backend = MemoryBackend::new();
        backend.insert_channel(channel("c1", "Math"));
        backend.fail_next(
            ApiOperation::FetchChannel,
            BackendError::Network("boom".to_string()),
        );

        assert!(backend.fetch_channel(&"c1".into()).await.is_err());
        assert!(backend.fetch_channel(&"c1".into()).await.is_ok());
    }

    #[tokio::test]
    async fn test_catalog_search_filters_and_orders() {
        let backend = MemoryBackend::from_fixture(catalog_fixture());

        let page = backend.search_catalog(&search(Some("SCIENCE"), 1, 10)).await.unwrap();
        let names: Vec<&str> = page.results.iter().map(|c| c.name.as_str()).collect();
        // private and deleted channels never show up
        assert_eq!(names, vec!["Earth Science", "life science", "Science Lab"]);
        assert_eq!(page.count, 3);
    }

    #[tokio::test]
    async fn test_catalog_search_matches_description() {
        let backend = MemoryBackend::from_fixture(catalog_fixture());
        let page = backend.search_catalog(&search(Some("fractions"), 1, 10)).await.unwrap();
        let ids: Vec<&str> = page.results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["math"]);
    }

    #[tokio::test]
    async fn test_catalog_search_paginates() {
        let backend = MemoryBackend::from_fixture(catalog_fixture());

        let first = backend.search_catalog(&search(None, 1, 2)).await.unwrap();
        let second = backend.search_catalog(&search(None, 2, 2)).await.unwrap();
        let beyond = backend.search_catalog(&search(None, 9, 2)).await.unwrap();

        assert_eq!(first.count, 4);
        assert_eq!(first.results.len(), 2);
        assert_eq!(second.results.len(), 2);
        assert_ne!(first.results[0].id, second.results[0].id);
        assert!(beyond.results.is_empty());
        assert_eq!(beyond.count, 4);
    }

    #[tokio::test]
    async fn test_catalog_search_language_filter() {
        let backend = MemoryBackend::from_fixture(catalog_fixture());
        let query = CatalogQuery {
            language: Some("es".to_string()),
            ..search(None, 1, 10)
        };
        let page = backend.search_catalog(&query).await.unwrap();
        let ids: Vec<&str> = page.results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["life"]);
    }

    #[tokio::test]
    async fn test_catalog_search_rejects_zero_page() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.search_catalog(&search(None, 0, 10)).await,
            Err(BackendError::Api { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_details_fall_back_to_summary() {
        let backend = MemoryBackend::new();
        backend.insert_channel(channel("c1", "Math"));

        let details = backend.fetch_channel_details(&"c1".into()).await.unwrap();
        assert_eq!(details.channel.name, "Math");
        assert_eq!(details.resource_count, 0);
    }

    #[tokio::test]
    async fn test_accept_grants_access() {
        let backend = MemoryBackend::new();
        backend.insert_channel(channel("c1", "Math"));
        let mut inv = invitation("i1", "c1", "Math");
        inv.share_mode = ShareMode::Edit;
        backend.insert_invitation(inv);

        let accepted = backend.accept_invitation(&"i1".into()).await.unwrap();
        assert!(accepted.accepted);
        assert!(backend.fetch_channel(&"c1".into()).await.unwrap().edit);
        assert!(backend.list_invitations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accept_declined_invitation_fails() {
        let backend = MemoryBackend::new();
        backend.insert_invitation(invitation("i1", "c1", "Math"));
        backend.decline_invitation(&"i1".into()).await.unwrap();

        assert!(matches!(
            backend.accept_invitation(&"i1".into()).await,
            Err(BackendError::Api { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_export_records_query() {
        let backend = MemoryBackend::new();
        let query = ChannelQuery {
            public: Some(true),
            ..Default::default()
        };
        backend.export_channels_csv(&query).await.unwrap();
        assert_eq!(backend.exports(), vec![query]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_applies() {
        let backend = MemoryBackend::new().with_latency(Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        let _ = backend.list_invitations().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn test_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"channels": [{"id": "c1", "name": "Math"}], "invitations": []}"#,
        )
        .unwrap();

        let backend = MemoryBackend::from_fixture_file(file.path()).unwrap();
        assert_eq!(backend.records.read().channels.len(), 1);
    }
}
