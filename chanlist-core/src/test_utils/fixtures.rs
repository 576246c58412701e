//! Sample records and ready-made stores

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core_backend::{Fixture, MemoryBackend};
use crate::core_channel_list::{
    ChannelDetails, ChannelList, ChannelListState, ChannelSummary, Invitation, NAMESPACE,
};
use crate::core_store::{
    ActionContext, ActionError, Message, Module, ModuleDescriptor, MutationError, RootState,
    RootStore, ValidationPolicy,
};

pub fn channel(id: &str, name: &str) -> ChannelSummary {
    ChannelSummary::new(id, name)
}

pub fn public_channel(id: &str, name: &str, language: &str) -> ChannelSummary {
    let mut channel = ChannelSummary::new(id, name);
    channel.public = true;
    channel.language = Some(language.to_string());
    channel
}

pub fn details(id: &str, name: &str) -> ChannelDetails {
    let mut details = ChannelDetails::from_summary(channel(id, name));
    details.resource_count = 42;
    details.languages = vec!["en".to_string()];
    details
}

pub fn invitation(id: &str, channel_id: &str, channel_name: &str) -> Invitation {
    let mut invitation = Invitation::new(id, channel_id, channel_name);
    invitation.sender_name = "Ada".to_string();
    invitation
}

/// Three live channels: Algebra (c1), biology (c2), Chemistry (c3)
pub fn sample_state() -> ChannelListState {
    let mut state = ChannelListState::new();
    for c in [
        channel("c2", "biology"),
        channel("c3", "Chemistry"),
        channel("c1", "Algebra"),
    ] {
        state.channels_map.insert(c.id.clone(), c);
    }
    state
}

/// Four public live channels plus one private and one deleted match for
/// "science"
pub fn catalog_fixture() -> Fixture {
    let mut math = public_channel("math", "Math", "en");
    math.description = "Fractions and decimals".to_string();

    let mut private = channel("private", "Private Science");
    private.language = Some("en".to_string());

    let mut gone = public_channel("gone", "Deleted Science", "en");
    gone.deleted = true;

    Fixture {
        channels: vec![
            math,
            public_channel("earth", "Earth Science", "en"),
            public_channel("life", "life science", "es"),
            public_channel("lab", "Science Lab", "en"),
            private,
            gone,
        ],
        details: Vec::new(),
        invitations: Vec::new(),
    }
}

/// Store with the channel list module over a memory backend
pub fn channel_list_store(
    backend: Arc<MemoryBackend>,
    policy: ValidationPolicy,
) -> RootStore {
    RootStore::builder()
        .policy(policy)
        .register(NAMESPACE, ChannelList::descriptor(backend))
        .expect("register channel list")
        .build()
}

/// Minimal module reading another module's state through the root snapshot
#[derive(Debug, Clone, Default)]
pub struct Counter;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CounterState {
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum CounterGetter {
    Count,
    /// Number of channels in the `channelList` module
    ChannelTotal,
}

impl Message for CounterGetter {
    const NAMES: &'static [&'static str] = &["count", "channelTotal"];

    fn name(&self) -> &'static str {
        match self {
            CounterGetter::Count => "count",
            CounterGetter::ChannelTotal => "channelTotal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum CounterMutation {
    Add(i64),
}

impl Message for CounterMutation {
    const NAMES: &'static [&'static str] = &["add"];

    fn name(&self) -> &'static str {
        "add"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum CounterAction {
    /// Commit `add(1)` `times` times
    Bump(u32),
    /// Commit `add(n)` for each `n`, in order
    Apply(Vec<i64>),
    /// Load channel `id` through the channel list module
    LoadChannel(String),
}

impl Message for CounterAction {
    const NAMES: &'static [&'static str] = &["bump", "apply", "loadChannel"];

    fn name(&self) -> &'static str {
        match self {
            CounterAction::Bump(_) => "bump",
            CounterAction::Apply(_) => "apply",
            CounterAction::LoadChannel(_) => "loadChannel",
        }
    }
}

#[async_trait]
impl Module for Counter {
    type State = CounterState;
    type Getter = CounterGetter;
    type Mutation = CounterMutation;
    type Action = CounterAction;
    type Outcome = Value;
    const READS_ROOT: bool = true;

    fn create_state(&self) -> CounterState {
        CounterState::default()
    }

    fn get(state: &CounterState, root: &RootState, getter: &CounterGetter) -> Value {
        match getter {
            CounterGetter::Count => json!(state.count),
            CounterGetter::ChannelTotal => json!(root
                .module(NAMESPACE)
                .and_then(|s| s["channelsMap"].as_object())
                .map_or(0, |m| m.len())),
        }
    }

    fn apply(state: &mut CounterState, mutation: CounterMutation) -> Result<(), MutationError> {
        match mutation {
            CounterMutation::Add(0) => Err(MutationError::Malformed("add(0)".to_string())),
            CounterMutation::Add(n) => {
                state.count += n;
                Ok(())
            }
        }
    }

    async fn run(&self, ctx: ActionContext<Self>, action: CounterAction) -> Result<Value, ActionError> {
        match action {
            CounterAction::Bump(times) => {
                for _ in 0..times {
                    ctx.commit(CounterMutation::Add(1));
                }
                Ok(json!(ctx.read(|s| s.count)))
            }
            CounterAction::Apply(amounts) => {
                for n in amounts {
                    ctx.commit(CounterMutation::Add(n));
                }
                Ok(json!(ctx.read(|s| s.count)))
            }
            CounterAction::LoadChannel(id) => {
                ctx.dispatch_root(&format!("{}/loadChannel", NAMESPACE), json!({ "id": id }))
                    .await
            }
        }
    }
}

pub fn counter_descriptor() -> ModuleDescriptor<Counter> {
    ModuleDescriptor::namespaced(Counter)
}
