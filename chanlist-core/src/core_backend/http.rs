//! REST backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{BackendError, ChannelApi};
use crate::config::BackendConfig;
use crate::core_channel_list::{
    CatalogPage, CatalogQuery, ChannelDetails, ChannelId, ChannelQuery, ChannelSummary,
    Invitation, InvitationId,
};

/// Backend talking to the Studio API over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(BackendError::Config("base URL is empty".to_string()));
        }
        let base = Url::parse(&base_url)
            .map_err(|e| BackendError::Config(format!("invalid base URL `{}`: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::Config(format!(
                "base URL `{}` cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base,
            token,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| BackendError::Config("backend.base_url is not set".to_string()))?;
        Self::new(base_url, config.token.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Endpoint URL below the base; each segment is percent-encoded, so ids
    /// containing `/`, `?` or `#` stay a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Config(format!("base URL `{}` cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, BackendError> {
        let builder = self.client.request(method, self.endpoint(segments)?);
        Ok(match &self.token {
            Some(token) => builder.header("Authorization", format!("Token {}", token)),
            None => builder,
        })
    }

    /// Map non-success statuses to errors; `kind`/`id` name the record for 404s
    async fn check(
        response: Response,
        kind: &'static str,
        id: &str,
    ) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::not_found(kind, id));
        }

        let message = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), %message, "backend returned an error");
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        kind: &'static str,
        id: &str,
    ) -> Result<T, BackendError> {
        let response = Self::check(request.send().await?, kind, id).await?;
        Ok(response.json::<T>().await?)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        kind: &'static str,
        id: &str,
    ) -> Result<(), BackendError> {
        Self::check(request.send().await?, kind, id).await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelApi for HttpBackend {
    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_channel(&self, id: &ChannelId) -> Result<ChannelSummary, BackendError> {
        let request = self.request(Method::GET, &["api", "channel", id.as_str()])?;
        self.fetch(request, "channel", id.as_str()).await
    }

    #[instrument(skip(self))]
    async fn list_channels(
        &self,
        query: &ChannelQuery,
    ) -> Result<Vec<ChannelSummary>, BackendError> {
        let request = self
            .request(Method::GET, &["api", "channel"])?
            .query(&query.to_pairs());
        self.fetch(request, "channel", "").await
    }

    #[instrument(skip(self))]
    async fn search_catalog(&self, query: &CatalogQuery) -> Result<CatalogPage, BackendError> {
        let request = self
            .request(Method::GET, &["api", "catalog"])?
            .query(&query.to_pairs());
        self.fetch(request, "catalog", "").await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn fetch_channel_details(&self, id: &ChannelId) -> Result<ChannelDetails, BackendError> {
        let request = self.request(Method::GET, &["api", "channel", id.as_str(), "details"])?;
        self.fetch(request, "channel", id.as_str()).await
    }

    #[instrument(skip(self))]
    async fn list_invitations(&self) -> Result<Vec<Invitation>, BackendError> {
        let request = self.request(Method::GET, &["api", "invitation"])?;
        self.fetch(request, "invitation", "").await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn accept_invitation(&self, id: &InvitationId) -> Result<Invitation, BackendError> {
        let request = self.request(Method::POST, &["api", "invitation", id.as_str(), "accept"])?;
        self.fetch(request, "invitation", id.as_str()).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn decline_invitation(&self, id: &InvitationId) -> Result<(), BackendError> {
        let request = self.request(Method::POST, &["api", "invitation", id.as_str(), "decline"])?;
        self.execute(request, "invitation", id.as_str()).await
    }

    #[instrument(skip(self))]
    async fn export_channels_csv(&self, query: &ChannelQuery) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, &["api", "channel", "export_csv"])?
            .json(query);
        self.execute(request, "channel", "").await
    }
}
