//! Synchronous state transitions
//!
//! [`apply`] is the only writer of [`ChannelListState`]. Every variant is
//! validated in full before the state is touched.

use serde::{Deserialize, Serialize};

use super::state::ChannelListState;
use super::types::{
    ChannelDetails, ChannelId, ChannelPatch, ChannelSummary, Invitation, InvitationId, Page,
};
use crate::core_store::{Message, MutationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ChannelListMutation {
    /// Insert or replace one channel
    SetChannel(ChannelSummary),
    /// Insert or replace each channel
    SetChannels(Vec<ChannelSummary>),
    /// Merge present fields into an existing channel
    UpdateChannel(ChannelPatch),
    /// Drop a channel and its details
    RemoveChannel { id: ChannelId },
    SetChannelDetails(ChannelDetails),
    SetInvitation(Invitation),
    /// Replace every invitation
    SetInvitations(Vec<Invitation>),
    RemoveInvitation { id: InvitationId },
    SetPage(Page),
}

impl Message for ChannelListMutation {
    const NAMES: &'static [&'static str] = &[
        "setChannel",
        "setChannels",
        "updateChannel",
        "removeChannel",
        "setChannelDetails",
        "setInvitation",
        "setInvitations",
        "removeInvitation",
        "setPage",
    ];

    fn name(&self) -> &'static str {
        match self {
            ChannelListMutation::SetChannel(_) => "setChannel",
            ChannelListMutation::SetChannels(_) => "setChannels",
            ChannelListMutation::UpdateChannel(_) => "updateChannel",
            ChannelListMutation::RemoveChannel { .. } => "removeChannel",
            ChannelListMutation::SetChannelDetails(_) => "setChannelDetails",
            ChannelListMutation::SetInvitation(_) => "setInvitation",
            ChannelListMutation::SetInvitations(_) => "setInvitations",
            ChannelListMutation::RemoveInvitation { .. } => "removeInvitation",
            ChannelListMutation::SetPage(_) => "setPage",
        }
    }
}

fn require_channel_id(id: &ChannelId) -> Result<(), MutationError> {
    if id.is_blank() {
        return Err(MutationError::MissingIdentifier { field: "id" });
    }
    Ok(())
}

fn require_invitation(invitation: &Invitation) -> Result<(), MutationError> {
    if invitation.id.is_blank() {
        return Err(MutationError::MissingIdentifier { field: "id" });
    }
    if invitation.channel_id.is_blank() {
        return Err(MutationError::MissingIdentifier { field: "channelId" });
    }
    Ok(())
}

fn validate(mutation: &ChannelListMutation) -> Result<(), MutationError> {
    match mutation {
        ChannelListMutation::SetChannel(channel) => require_channel_id(&channel.id),
        ChannelListMutation::SetChannels(channels) => channels
            .iter()
            .try_for_each(|channel| require_channel_id(&channel.id)),
        ChannelListMutation::UpdateChannel(patch) => require_channel_id(&patch.id),
        ChannelListMutation::RemoveChannel { id } => require_channel_id(id),
        ChannelListMutation::SetChannelDetails(details) => require_channel_id(details.id()),
        ChannelListMutation::SetInvitation(invitation) => require_invitation(invitation),
        ChannelListMutation::SetInvitations(invitations) => {
            invitations.iter().try_for_each(require_invitation)
        }
        ChannelListMutation::RemoveInvitation { id } => {
            if id.is_blank() {
                Err(MutationError::MissingIdentifier { field: "id" })
            } else {
                Ok(())
            }
        }
        ChannelListMutation::SetPage(page) => {
            if page.results.iter().any(ChannelId::is_blank) {
                Err(MutationError::MissingIdentifier { field: "results" })
            } else {
                Ok(())
            }
        }
    }
}

/// Apply `mutation` to `state`; on error `state` is untouched
pub fn apply(
    state: &mut ChannelListState,
    mutation: ChannelListMutation,
) -> Result<(), MutationError> {
    validate(&mutation)?;

    match mutation {
        ChannelListMutation::SetChannel(channel) => {
            state.channels_map.insert(channel.id.clone(), channel);
        }
        ChannelListMutation::SetChannels(channels) => {
            for channel in channels {
                state.channels_map.insert(channel.id.clone(), channel);
            }
        }
        ChannelListMutation::UpdateChannel(patch) => {
            if let Some(channel) = state.channels_map.get_mut(&patch.id) {
                patch.apply_to(channel);
            }
        }
        ChannelListMutation::RemoveChannel { id } => {
            state.channels_map.remove(&id);
            state.channel_details_map.remove(&id);
        }
        ChannelListMutation::SetChannelDetails(details) => {
            state
                .channel_details_map
                .insert(details.id().clone(), details);
        }
        ChannelListMutation::SetInvitation(invitation) => {
            state
                .invitations_map
                .insert(invitation.id.clone(), invitation);
        }
        ChannelListMutation::SetInvitations(invitations) => {
            state.invitations_map = invitations
                .into_iter()
                .map(|invitation| (invitation.id.clone(), invitation))
                .collect();
        }
        ChannelListMutation::RemoveInvitation { id } => {
            state.invitations_map.remove(&id);
        }
        ChannelListMutation::SetPage(page) => {
            state.page = page;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{channel, details, invitation, sample_state};
    use serde_json::json;

    #[test]
    fn test_set_channel_inserts_and_replaces() {
        let mut state = ChannelListState::new();
        apply(&mut state, ChannelListMutation::SetChannel(channel("c1", "Math"))).unwrap();
        apply(&mut state, ChannelListMutation::SetChannel(channel("c1", "Maths"))).unwrap();

        assert_eq!(state.channels_map.len(), 1);
        assert_eq!(state.channels_map[&ChannelId::from("c1")].name, "Maths");
    }

    #[test]
    fn test_set_channels_rejects_whole_batch() {
        let mut state = ChannelListState::new();
        let batch = vec![channel("c1", "Math"), channel("", "Nameless")];

        assert_eq!(
            apply(&mut state, ChannelListMutation::SetChannels(batch)),
            Err(MutationError::MissingIdentifier { field: "id" })
        );
        assert!(state.channels_map.is_empty());
    }

    #[test]
    fn test_update_channel_absent_is_noop() {
        let mut state = ChannelListState::new();
        let patch = ChannelPatch {
            name: Some("Ghost".to_string()),
            ..ChannelPatch::new("c1")
        };
        apply(&mut state, ChannelListMutation::UpdateChannel(patch)).unwrap();
        assert_eq!(state, ChannelListState::new());
    }

    #[test]
    fn test_remove_channel_drops_details() {
        let mut state = sample_state();
        apply(&mut state, ChannelListMutation::SetChannelDetails(details("c1", "Algebra"))).unwrap();

        apply(&mut state, ChannelListMutation::RemoveChannel { id: "c1".into() }).unwrap();
        assert!(!state.channels_map.contains_key(&ChannelId::from("c1")));
        assert!(!state.channel_details_map.contains_key(&ChannelId::from("c1")));

        // absent id
        apply(&mut state, ChannelListMutation::RemoveChannel { id: "c1".into() }).unwrap();
    }

    #[test]
    fn test_set_invitations_replaces_map() {
        let mut state = ChannelListState::new();
        apply(
            &mut state,
            ChannelListMutation::SetInvitation(invitation("old", "c1", "Math")),
        )
        .unwrap();
        apply(
            &mut state,
            ChannelListMutation::SetInvitations(vec![invitation("new", "c2", "Art")]),
        )
        .unwrap();

        let ids: Vec<&str> = state.invitations_map.keys().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["new"]);
    }

    #[test]
    fn test_invitation_requires_channel_id() {
        let mut state = ChannelListState::new();
        assert_eq!(
            apply(
                &mut state,
                ChannelListMutation::SetInvitation(invitation("i1", " ", "Math"))
            ),
            Err(MutationError::MissingIdentifier { field: "channelId" })
        );
    }

    #[test]
    fn test_set_page_rejects_blank_result() {
        let mut state = ChannelListState::new();
        let page = Page {
            results: vec!["c1".into(), "".into()],
            ..Default::default()
        };
        assert!(apply(&mut state, ChannelListMutation::SetPage(page)).is_err());
        assert_eq!(state.page, Page::default());
    }

    #[test]
    fn test_from_parts_payload_shapes() {
        let mutation =
            ChannelListMutation::from_parts("removeChannel", json!({"id": "c1"})).unwrap();
        assert_eq!(mutation, ChannelListMutation::RemoveChannel { id: "c1".into() });
        assert_eq!(mutation.name(), "removeChannel");

        let mutation = ChannelListMutation::from_parts("setChannels", json!([{"id": "c1"}])).unwrap();
        assert_eq!(mutation.name(), "setChannels");

        assert!(ChannelListMutation::from_parts("setChannel", json!({"name": "x"})).is_err());
        assert!(ChannelListMutation::from_parts("dropTables", json!({})).is_err());
    }
}
