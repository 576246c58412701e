use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{ChannelDetails, ChannelId, ChannelSummary, Invitation, InvitationId, Page};

/// Entire observable state of the channel list module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelListState {
    pub channels_map: BTreeMap<ChannelId, ChannelSummary>,
    pub channel_details_map: BTreeMap<ChannelId, ChannelDetails>,
    pub invitations_map: BTreeMap<InvitationId, Invitation>,
    pub page: Page,
}

impl ChannelListState {
    pub fn new() -> Self {
        Self::default()
    }
}
