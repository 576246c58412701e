//! Derived views of the channel list state
//!
//! Each getter is a plain function over a state snapshot. The
//! [`ChannelListGetter`] enum names them for routing through the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::state::ChannelListState;
use super::types::{ChannelDetails, ChannelId, ChannelSummary, Invitation, InvitationId, Page};
use crate::core_store::{to_json, Message};

/// Non-deleted channels ordered by name, case-insensitively, then by id
pub fn channels(state: &ChannelListState) -> Vec<&ChannelSummary> {
    let mut channels: Vec<&ChannelSummary> = state
        .channels_map
        .values()
        .filter(|channel| !channel.deleted)
        .collect();
    channels.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    channels
}

pub fn get_channel<'a>(state: &'a ChannelListState, id: &ChannelId) -> Option<&'a ChannelSummary> {
    state.channels_map.get(id)
}

pub fn get_channel_details<'a>(
    state: &'a ChannelListState,
    id: &ChannelId,
) -> Option<&'a ChannelDetails> {
    state.channel_details_map.get(id)
}

/// Pending invitations ordered by channel name
pub fn invitations(state: &ChannelListState) -> Vec<&Invitation> {
    let mut invitations: Vec<&Invitation> = state
        .invitations_map
        .values()
        .filter(|invitation| invitation.is_pending())
        .collect();
    invitations.sort_by(|a, b| {
        a.channel_name
            .to_lowercase()
            .cmp(&b.channel_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    invitations
}

pub fn get_invitation<'a>(
    state: &'a ChannelListState,
    id: &InvitationId,
) -> Option<&'a Invitation> {
    state.invitations_map.get(id)
}

/// Pending invitations for one channel
pub fn invitation_count(state: &ChannelListState, channel_id: &ChannelId) -> usize {
    state
        .invitations_map
        .values()
        .filter(|invitation| invitation.is_pending() && &invitation.channel_id == channel_id)
        .count()
}

pub fn page(state: &ChannelListState) -> &Page {
    &state.page
}

/// Channels of the current page in page order. Ids without a loaded
/// channel are skipped.
pub fn page_channels(state: &ChannelListState) -> Vec<&ChannelSummary> {
    state
        .page
        .results
        .iter()
        .filter_map(|id| state.channels_map.get(id))
        .collect()
}

/// Routable getter names and their arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ChannelListGetter {
    Channels,
    GetChannel {
        id: ChannelId,
    },
    GetChannelDetails {
        id: ChannelId,
    },
    Invitations,
    GetInvitation {
        id: InvitationId,
    },
    InvitationCount {
        #[serde(rename = "channelId")]
        channel_id: ChannelId,
    },
    Page,
    PageChannels,
}

impl Message for ChannelListGetter {
    const NAMES: &'static [&'static str] = &[
        "channels",
        "getChannel",
        "getChannelDetails",
        "invitations",
        "getInvitation",
        "invitationCount",
        "page",
        "pageChannels",
    ];

    fn name(&self) -> &'static str {
        match self {
            ChannelListGetter::Channels => "channels",
            ChannelListGetter::GetChannel { .. } => "getChannel",
            ChannelListGetter::GetChannelDetails { .. } => "getChannelDetails",
            ChannelListGetter::Invitations => "invitations",
            ChannelListGetter::GetInvitation { .. } => "getInvitation",
            ChannelListGetter::InvitationCount { .. } => "invitationCount",
            ChannelListGetter::Page => "page",
            ChannelListGetter::PageChannels => "pageChannels",
        }
    }
}

pub fn evaluate(state: &ChannelListState, getter: &ChannelListGetter) -> Value {
    match getter {
        ChannelListGetter::Channels => to_json(channels(state)),
        ChannelListGetter::GetChannel { id } => to_json(get_channel(state, id)),
        ChannelListGetter::GetChannelDetails { id } => to_json(get_channel_details(state, id)),
        ChannelListGetter::Invitations => to_json(invitations(state)),
        ChannelListGetter::GetInvitation { id } => to_json(get_invitation(state, id)),
        ChannelListGetter::InvitationCount { channel_id } => {
            to_json(invitation_count(state, channel_id))
        }
        ChannelListGetter::Page => to_json(page(state)),
        ChannelListGetter::PageChannels => to_json(page_channels(state)),
    }
}
