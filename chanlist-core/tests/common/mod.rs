//! Shared setup for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chanlist_core::core_backend::MemoryBackend;
use chanlist_core::core_channel_list::{ChannelSummary, Invitation, ShareMode};
use chanlist_core::core_store::{
    ActionContext, ActionError, Message, Module, ModuleDescriptor, MutationError, RootState,
    StoreError, StoreEvent, ValidationPolicy,
};
use chanlist_core::{ChannelList, RootStore, CHANNEL_LIST};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

pub fn channel(id: &str, name: &str) -> ChannelSummary {
    ChannelSummary::new(id, name)
}

/// Backend with Math (c1), Art (c2) and one pending edit invitation to c2
pub fn seeded_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new();
    backend.insert_channel(channel("c1", "Math"));
    backend.insert_channel(channel("c2", "Art"));

    let mut invitation = Invitation::new("i1", "c2", "Art");
    invitation.share_mode = ShareMode::Edit;
    invitation.sender_name = "Grace".to_string();
    backend.insert_invitation(invitation);

    Arc::new(backend)
}

pub fn store_with(backend: Arc<MemoryBackend>, policy: ValidationPolicy) -> RootStore {
    RootStore::builder()
        .policy(policy)
        .register(CHANNEL_LIST, ChannelList::descriptor(backend))
        .expect("register channelList")
        .register(JOURNAL, ModuleDescriptor::namespaced(Journal))
        .expect("register journal")
        .build()
}

pub fn store(backend: Arc<MemoryBackend>) -> RootStore {
    store_with(backend, ValidationPolicy::Strict)
}

pub fn drain(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn committed(events: &[StoreEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            StoreEvent::Committed { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect()
}

pub const JOURNAL: &str = "journal";

/// A second module used to exercise composition and cross-namespace commits
#[derive(Debug, Clone)]
pub struct Journal;

#[derive(Debug, Clone, Default, Serialize)]
pub struct JournalState {
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum JournalGetter {
    Notes,
}

impl Message for JournalGetter {
    const NAMES: &'static [&'static str] = &["notes"];

    fn name(&self) -> &'static str {
        "notes"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum JournalMutation {
    Note(String),
}

impl Message for JournalMutation {
    const NAMES: &'static [&'static str] = &["note"];

    fn name(&self) -> &'static str {
        "note"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum JournalAction {
    /// Commit a local note
    Record(String),
    /// Commit each channel to `channelList/setChannel`, in order
    SetChannels(Vec<ChannelSummary>),
}

impl Message for JournalAction {
    const NAMES: &'static [&'static str] = &["record", "setChannels"];

    fn name(&self) -> &'static str {
        match self {
            JournalAction::Record(_) => "record",
            JournalAction::SetChannels(_) => "setChannels",
        }
    }
}

#[async_trait]
impl Module for Journal {
    type State = JournalState;
    type Getter = JournalGetter;
    type Mutation = JournalMutation;
    type Action = JournalAction;
    type Outcome = ();

    fn create_state(&self) -> JournalState {
        JournalState::default()
    }

    fn get(state: &JournalState, _root: &RootState, _getter: &JournalGetter) -> Value {
        json!(state.notes)
    }

    fn apply(state: &mut JournalState, mutation: JournalMutation) -> Result<(), MutationError> {
        let JournalMutation::Note(note) = mutation;
        state.notes.push(note);
        Ok(())
    }

    async fn run(&self, ctx: ActionContext<Self>, action: JournalAction) -> Result<(), ActionError> {
        match action {
            JournalAction::Record(note) => ctx.commit(JournalMutation::Note(note)),
            JournalAction::SetChannels(channels) => {
                for channel in channels {
                    ctx.commit_root(
                        &format!("{}/setChannel", CHANNEL_LIST),
                        serde_json::to_value(channel).map_err(StoreError::from)?,
                    )?;
                }
            }
        }
        Ok(())
    }
}
