use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chanlist_core::config::{BackendKind, Config};
use chanlist_core::core_backend;
use chanlist_core::core_channel_list::{CatalogQuery, ChannelQuery, DEFAULT_PAGE_SIZE};
use chanlist_core::logging::{init_logging_with_config, LogLevel};
use chanlist_core::metrics::init_metrics;
use chanlist_core::{ChannelList, RootStore, StoreView, CHANNEL_LIST};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "chanlist")]
#[command(author, version, about = "Drive the channel list store from the command line", long_about = None)]
struct Args {
    /// TOML configuration file; CHANLIST_* environment variables apply otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Seed the in-memory backend from a JSON fixture
    #[arg(long, conflicts_with = "base_url")]
    fixture: Option<PathBuf>,

    /// Use the HTTP backend rooted at this URL
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Load one channel
    Channel { id: String },

    /// Load the channels visible to the user
    Channels {
        #[arg(long)]
        keywords: Option<String>,
        /// Only public channels
        #[arg(long)]
        public: bool,
    },

    /// Search the public catalog
    Catalog {
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        #[arg(long)]
        language: Option<String>,
    },

    /// Load a channel's details
    Details {
        id: String,
        /// Refetch even if already loaded
        #[arg(long)]
        force: bool,
    },

    /// Load pending invitations
    Invitations,

    /// Accept an invitation
    Accept { id: String },

    /// Decline an invitation
    Decline { id: String },

    /// Request a CSV export of matching channels
    ExportCsv {
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long)]
        public: bool,
    },

    /// Print the initial state of every module
    State,
}

/// One action dispatch followed by getter reads
#[derive(Debug, PartialEq)]
struct Plan {
    action: Option<(&'static str, Value)>,
    getters: Vec<(&'static str, Value)>,
}

fn channel_query(keywords: Option<String>, public: bool) -> ChannelQuery {
    ChannelQuery {
        keywords,
        public: public.then_some(true),
        ..Default::default()
    }
}

impl Plan {
    fn for_command(command: Command) -> Result<Self> {
        let (action, getters) = match command {
            Command::Channel { id } => (
                Some(("loadChannel", json!({ "id": id }))),
                vec![("getChannel", json!({ "id": id }))],
            ),
            Command::Channels { keywords, public } => (
                Some((
                    "loadChannelList",
                    serde_json::to_value(channel_query(keywords, public))?,
                )),
                vec![("channels", Value::Null)],
            ),
            Command::Catalog {
                keywords,
                page,
                page_size,
                language,
            } => {
                let query = CatalogQuery {
                    keywords,
                    language,
                    page,
                    page_size,
                };
                (
                    Some(("searchCatalog", serde_json::to_value(query)?)),
                    vec![("page", Value::Null), ("pageChannels", Value::Null)],
                )
            }
            Command::Details { id, force } => (
                Some(("loadChannelDetails", json!({ "id": id, "force": force }))),
                vec![("getChannelDetails", json!({ "id": id }))],
            ),
            Command::Invitations => (
                Some(("loadInvitationList", Value::Null)),
                vec![("invitations", Value::Null)],
            ),
            Command::Accept { id } => (
                Some(("acceptInvitation", json!({ "id": id }))),
                vec![("getInvitation", json!({ "id": id }))],
            ),
            Command::Decline { id } => (
                Some(("declineInvitation", json!({ "id": id }))),
                vec![("invitations", Value::Null)],
            ),
            Command::ExportCsv { keywords, public } => (
                Some((
                    "downloadChannelsCsv",
                    serde_json::to_value(channel_query(keywords, public))?,
                )),
                Vec::new(),
            ),
            Command::State => (None, Vec::new()),
        };

        Ok(Self { action, getters })
    }
}

#[derive(Debug, Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<Value>,
    getters: Map<String, Value>,
}

async fn execute(view: &StoreView, plan: Plan) -> Result<Report> {
    let outcome = match plan.action {
        Some((name, payload)) => {
            let path = format!("{}/{}", CHANNEL_LIST, name);
            debug!(action = %path, %payload, "dispatching");
            Some(
                view.dispatch(&path, payload)
                    .await
                    .with_context(|| format!("{} failed", path))?,
            )
        }
        None => None,
    };

    let mut getters = Map::new();
    for (name, args) in plan.getters {
        let path = format!("{}/{}", CHANNEL_LIST, name);
        getters.insert(path.clone(), view.get(&path, args)?);
    }

    Ok(Report { outcome, getters })
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Config::from_env().context("loading configuration from the environment"),
    }
}

/// Layer command-line flags over the loaded configuration
fn apply_args(config: &mut Config, args: &Args) -> Result<()> {
    if let Some(level) = &args.log_level {
        config.logging.level = level.parse::<LogLevel>()?;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    if let Some(fixture) = &args.fixture {
        config.backend.kind = BackendKind::Memory;
        config.backend.fixture = Some(fixture.clone());
    }
    if let Some(base_url) = &args.base_url {
        config.backend.kind = BackendKind::Http;
        config.backend.base_url = Some(base_url.clone());
    }
    config.validate()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    apply_args(&mut config, &args)?;

    init_logging_with_config(config.logging.to_log_config())?;
    if config.metrics.enabled {
        init_metrics();
    }

    let backend = core_backend::from_config(&config.backend)?;
    let store = RootStore::builder()
        .with_config(&config.store)
        .register(CHANNEL_LIST, ChannelList::descriptor(backend))?
        .build();
    info!(backend = ?config.backend.kind, policy = ?store.policy(), "store ready");

    let output = match args.command {
        Command::State => store.state()?.as_value().clone(),
        command => {
            let report = execute(&store.view(), Plan::for_command(command)?).await?;
            serde_json::to_value(report)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
