//! Channel list records

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank identifiers never address a record
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Invitation identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvitationId(pub String);

impl InvitationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for InvitationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvitationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InvitationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A channel as it appears in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: ChannelId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub bookmark: bool,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl ChannelSummary {
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            language: None,
            thumbnail_url: None,
            public: false,
            bookmark: false,
            edit: false,
            view: false,
            deleted: false,
            version: 0,
            modified: None,
        }
    }

    /// Case-insensitive substring match on name or description
    pub fn matches_keywords(&self, keywords: &str) -> bool {
        let needle = keywords.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// Content kind tally inside a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindCount {
    pub kind_id: String,
    pub count: u64,
}

/// A resource shown as a preview of the channel's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub kind: String,
}

/// Full channel record, fetched on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDetails {
    #[serde(flatten)]
    pub channel: ChannelSummary,
    #[serde(default)]
    pub resource_count: u64,
    #[serde(default)]
    pub resource_size: u64,
    #[serde(default)]
    pub kind_count: Vec<KindCount>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub accessible_languages: Vec<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub copyright_holders: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub aggregators: Vec<String>,
    #[serde(default)]
    pub sample_nodes: Vec<SampleNode>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_published: Option<DateTime<Utc>>,
}

impl ChannelDetails {
    /// Details with nothing beyond the summary fields
    pub fn from_summary(channel: ChannelSummary) -> Self {
        Self {
            channel,
            resource_count: 0,
            resource_size: 0,
            kind_count: Vec::new(),
            languages: Vec::new(),
            accessible_languages: Vec::new(),
            licenses: Vec::new(),
            tags: Vec::new(),
            copyright_holders: Vec::new(),
            authors: Vec::new(),
            providers: Vec::new(),
            aggregators: Vec::new(),
            sample_nodes: Vec::new(),
            created: None,
            last_published: None,
        }
    }

    pub fn id(&self) -> &ChannelId {
        &self.channel.id
    }
}

/// Access level granted by an invitation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareMode {
    Edit,
    #[default]
    View,
}

/// An invitation to collaborate on a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: InvitationId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub share_mode: ShareMode,
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub declined: bool,
}

impl Invitation {
    pub fn new(
        id: impl Into<InvitationId>,
        channel_id: impl Into<ChannelId>,
        channel_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            channel_name: channel_name.into(),
            sender_name: String::new(),
            share_mode: ShareMode::View,
            accepted: false,
            declined: false,
        }
    }

    /// Neither accepted nor declined
    pub fn is_pending(&self) -> bool {
        !self.accepted && !self.declined
    }
}

/// Partial update to an existing channel; only present fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPatch {
    pub id: ChannelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl ChannelPatch {
    pub fn new(id: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, channel: &mut ChannelSummary) {
        if let Some(name) = &self.name {
            channel.name = name.clone();
        }
        if let Some(description) = &self.description {
            channel.description = description.clone();
        }
        if let Some(language) = &self.language {
            channel.language = Some(language.clone());
        }
        if let Some(thumbnail_url) = &self.thumbnail_url {
            channel.thumbnail_url = Some(thumbnail_url.clone());
        }
        if let Some(public) = self.public {
            channel.public = public;
        }
        if let Some(bookmark) = self.bookmark {
            channel.bookmark = bookmark;
        }
        if let Some(deleted) = self.deleted {
            channel.deleted = deleted;
        }
    }
}

/// Pagination metadata for the current listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total: u64,
    /// Channel ids on this page, in display order
    #[serde(default)]
    pub results: Vec<ChannelId>,
    /// Filters that produced this page
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,
}

impl Page {
    /// Number of pages for `total` results; zero when the page size is unset
    pub fn page_count(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total.div_ceil(u64::from(self.size))
        }
    }
}

/// Filters for a channel listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<ChannelId>,
}

impl ChannelQuery {
    /// Whether `channel` passes every filter. Deleted channels never match.
    pub fn matches(&self, channel: &ChannelSummary) -> bool {
        !channel.deleted
            && self
                .keywords
                .as_deref()
                .map_or(true, |k| channel.matches_keywords(k))
            && self.public.map_or(true, |p| channel.public == p)
            && self.edit.map_or(true, |e| channel.edit == e)
            && self.bookmark.map_or(true, |b| channel.bookmark == b)
            && (self.ids.is_empty() || self.ids.contains(&channel.id))
    }

    /// Query string pairs, in a stable order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(keywords) = &self.keywords {
            pairs.push(("keywords".to_string(), keywords.clone()));
        }
        if let Some(public) = self.public {
            pairs.push(("public".to_string(), public.to_string()));
        }
        if let Some(edit) = self.edit {
            pairs.push(("edit".to_string(), edit.to_string()));
        }
        if let Some(bookmark) = self.bookmark {
            pairs.push(("bookmark".to_string(), bookmark.to_string()));
        }
        if !self.ids.is_empty() {
            let ids: Vec<&str> = self.ids.iter().map(ChannelId::as_str).collect();
            pairs.push(("ids".to_string(), ids.join(",")));
        }
        pairs
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 25;

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Public catalog search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// 1-based
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            keywords: None,
            language: None,
            page: first_page(),
            page_size: default_page_size(),
        }
    }
}

impl CatalogQuery {
    /// The filters to record on the resulting [`Page`]
    pub fn filters(&self) -> BTreeMap<String, Value> {
        let mut filters = BTreeMap::new();
        if let Some(keywords) = &self.keywords {
            filters.insert("keywords".to_string(), Value::String(keywords.clone()));
        }
        if let Some(language) = &self.language {
            filters.insert("language".to_string(), Value::String(language.clone()));
        }
        filters
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters()
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect();
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("page_size".to_string(), self.page_size.to_string()));
        pairs
    }
}

/// One page of catalog results as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub page: u32,
    pub page_size: u32,
    /// Matches across all pages
    pub count: u64,
    pub results: Vec<ChannelSummary>,
}

impl CatalogPage {
    /// Page metadata for this result set
    pub fn to_page(&self, query: &CatalogQuery) -> Page {
        Page {
            number: self.page,
            size: self.page_size,
            total: self.count,
            results: self.results.iter().map(|c| c.id.clone()).collect(),
            filters: query.filters(),
        }
    }
}
