//! Asynchronous channel list workflows
//!
//! Each action calls the backend, then commits what came back. A failed
//! backend call ends the action with no further commits. Records without an
//! identifier never reach a mutation: list replies drop them with a warning,
//! single-record replies fail the action as undecodable.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::mutations::ChannelListMutation;
use super::types::{
    CatalogQuery, ChannelDetails, ChannelId, ChannelQuery, ChannelSummary, Invitation,
    InvitationId, Page,
};
use super::ChannelList;
use crate::core_backend::{BackendError, ChannelApi};
use crate::core_store::{ActionContext, ActionError, Message};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ChannelListAction {
    LoadChannel {
        id: ChannelId,
    },
    LoadChannelList(ChannelQuery),
    SearchCatalog(CatalogQuery),
    /// Served from state unless `force` is set or nothing is cached
    LoadChannelDetails {
        id: ChannelId,
        #[serde(default)]
        force: bool,
    },
    LoadInvitationList,
    AcceptInvitation {
        id: InvitationId,
    },
    DeclineInvitation {
        id: InvitationId,
    },
    DownloadChannelsCsv(ChannelQuery),
}

impl Message for ChannelListAction {
    const NAMES: &'static [&'static str] = &[
        "loadChannel",
        "loadChannelList",
        "searchCatalog",
        "loadChannelDetails",
        "loadInvitationList",
        "acceptInvitation",
        "declineInvitation",
        "downloadChannelsCsv",
    ];

    fn name(&self) -> &'static str {
        match self {
            ChannelListAction::LoadChannel { .. } => "loadChannel",
            ChannelListAction::LoadChannelList(_) => "loadChannelList",
            ChannelListAction::SearchCatalog(_) => "searchCatalog",
            ChannelListAction::LoadChannelDetails { .. } => "loadChannelDetails",
            ChannelListAction::LoadInvitationList => "loadInvitationList",
            ChannelListAction::AcceptInvitation { .. } => "acceptInvitation",
            ChannelListAction::DeclineInvitation { .. } => "declineInvitation",
            ChannelListAction::DownloadChannelsCsv(_) => "downloadChannelsCsv",
        }
    }
}

/// What a settled action resolved with
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChannelListOutcome {
    Channel(ChannelSummary),
    Channels(Vec<ChannelSummary>),
    Details(ChannelDetails),
    Page(Page),
    Invitations(Vec<Invitation>),
    Done,
}

impl ChannelListOutcome {
    pub fn channel(&self) -> Option<&ChannelSummary> {
        match self {
            ChannelListOutcome::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    pub fn channels(&self) -> Option<&[ChannelSummary]> {
        match self {
            ChannelListOutcome::Channels(channels) => Some(channels),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&ChannelDetails> {
        match self {
            ChannelListOutcome::Details(details) => Some(details),
            _ => None,
        }
    }

    pub fn page(&self) -> Option<&Page> {
        match self {
            ChannelListOutcome::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn invitations(&self) -> Option<&[Invitation]> {
        match self {
            ChannelListOutcome::Invitations(invitations) => Some(invitations),
            _ => None,
        }
    }
}

fn check_payload(
    ctx: &ActionContext<ChannelList>,
    action: &ChannelListAction,
) -> Result<(), ActionError> {
    let blank = match action {
        ChannelListAction::LoadChannel { id } | ChannelListAction::LoadChannelDetails { id, .. } => {
            id.is_blank().then_some("id must not be empty")
        }
        ChannelListAction::AcceptInvitation { id } | ChannelListAction::DeclineInvitation { id } => {
            id.is_blank().then_some("id must not be empty")
        }
        ChannelListAction::SearchCatalog(query) => (query.page == 0 || query.page_size == 0)
            .then_some("page and pageSize must be positive"),
        ChannelListAction::LoadChannelList(_)
        | ChannelListAction::LoadInvitationList
        | ChannelListAction::DownloadChannelsCsv(_) => None,
    };

    match blank {
        Some(reason) => Err(ActionError::invalid_payload(ctx.path(), reason)),
        None => Ok(()),
    }
}

fn missing_id(kind: &str) -> ActionError {
    BackendError::Decode(format!("backend returned a {} without an id", kind)).into()
}

fn keyed_channels(path: &str, mut channels: Vec<ChannelSummary>) -> Vec<ChannelSummary> {
    let before = channels.len();
    channels.retain(|channel| !channel.id.is_blank());
    if channels.len() < before {
        warn!(action = path, skipped = before - channels.len(), "dropping channels without an id");
    }
    channels
}

fn keyed_invitations(path: &str, mut invitations: Vec<Invitation>) -> Vec<Invitation> {
    let before = invitations.len();
    invitations.retain(|invitation| !invitation.id.is_blank() && !invitation.channel_id.is_blank());
    if invitations.len() < before {
        warn!(
            action = path,
            skipped = before - invitations.len(),
            "dropping invitations without an id or channel id"
        );
    }
    invitations
}

pub(crate) async fn run(
    api: &dyn ChannelApi,
    ctx: ActionContext<ChannelList>,
    action: ChannelListAction,
) -> Result<ChannelListOutcome, ActionError> {
    check_payload(&ctx, &action)?;

    match action {
        ChannelListAction::LoadChannel { id } => {
            let channel = api.fetch_channel(&id).await?;
            if channel.id.is_blank() {
                return Err(missing_id("channel"));
            }
            ctx.commit(ChannelListMutation::SetChannel(channel.clone()));
            Ok(ChannelListOutcome::Channel(channel))
        }

        ChannelListAction::LoadChannelList(query) => {
            let channels = keyed_channels(ctx.path(), api.list_channels(&query).await?);
            ctx.commit(ChannelListMutation::SetChannels(channels.clone()));
            Ok(ChannelListOutcome::Channels(channels))
        }

        ChannelListAction::SearchCatalog(query) => {
            let mut results = api.search_catalog(&query).await?;
            results.results = keyed_channels(ctx.path(), results.results);
            let page = results.to_page(&query);
            ctx.commit(ChannelListMutation::SetChannels(results.results));
            ctx.commit(ChannelListMutation::SetPage(page.clone()));
            Ok(ChannelListOutcome::Page(page))
        }

        ChannelListAction::LoadChannelDetails { id, force } => {
            if !force {
                let cached = ctx.read(|state| state.channel_details_map.get(&id).cloned());
                if let Some(cached) = cached {
                    return Ok(ChannelListOutcome::Details(cached));
                }
            }
            let details = api.fetch_channel_details(&id).await?;
            if details.id().is_blank() {
                return Err(missing_id("channel details record"));
            }
            ctx.commit(ChannelListMutation::SetChannelDetails(details.clone()));
            Ok(ChannelListOutcome::Details(details))
        }

        ChannelListAction::LoadInvitationList => {
            let invitations = keyed_invitations(ctx.path(), api.list_invitations().await?);
            ctx.commit(ChannelListMutation::SetInvitations(invitations.clone()));
            Ok(ChannelListOutcome::Invitations(invitations))
        }

        ChannelListAction::AcceptInvitation { id } => {
            let mut invitation = api.accept_invitation(&id).await?;
            if invitation.id.is_blank() || invitation.channel_id.is_blank() {
                return Err(missing_id("invitation"));
            }
            invitation.accepted = true;
            let channel_id = invitation.channel_id.clone();
            ctx.commit(ChannelListMutation::SetInvitation(invitation));
            ctx.dispatch(ChannelListAction::LoadChannel { id: channel_id })
                .await
        }

        ChannelListAction::DeclineInvitation { id } => {
            api.decline_invitation(&id).await?;
            ctx.commit(ChannelListMutation::RemoveInvitation { id });
            Ok(ChannelListOutcome::Done)
        }

        ChannelListAction::DownloadChannelsCsv(query) => {
            api.export_channels_csv(&query).await?;
            Ok(ChannelListOutcome::Done)
        }
    }
}
