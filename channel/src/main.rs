//! CalcWizard channel daemon.
//!
//! Serves the channel over HTTP and optionally registers it with a hub. Two
//! subcommands:
//!
//! 1. **`serve`** (default) → load history, listen, answer arithmetic
//! 2. **`register`** → announce the channel to the hub once and exit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use calcwizard_channel::config::{
    ChannelConfig, DEFAULT_CHANNEL_NAME, DEFAULT_STORAGE_PATH, DEFAULT_TYPE_OF_SERVICE,
};
use calcwizard_channel::hub::{HubClient, Registration};
use calcwizard_channel::{http, AuthScope, ChannelService};
use calcwizard_common::retention::{MAX_AGE_SECONDS, MAX_MESSAGES};
use clap::{Args, Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "calcwizard-channel", about = "CalcWizard arithmetic chat channel")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP channel (the default).
    Serve(ServeArgs),
    /// Register this channel with the hub and exit.
    Register(ChannelArgs),
}

#[derive(Args, Clone)]
struct ChannelArgs {
    /// Channel name shown by /health and used as the reply sender.
    #[arg(long, env = "CHANNEL_NAME", default_value = DEFAULT_CHANNEL_NAME)]
    name: String,

    /// Shared secret clients send as `Authorization: authkey <secret>`. Required.
    #[arg(long, env = "CHANNEL_AUTHKEY")]
    authkey: Option<String>,

    /// Public URL of this channel, announced to the hub.
    #[arg(long, env = "CHANNEL_ENDPOINT")]
    endpoint: Option<String>,

    /// Hub base URL (e.g. "http://localhost:5555").
    #[arg(long, env = "HUB_URL")]
    hub_url: Option<String>,

    /// Key for authenticating against the hub (distinct from --authkey).
    #[arg(long, env = "HUB_AUTHKEY")]
    hub_authkey: Option<String>,

    #[arg(long, default_value = DEFAULT_TYPE_OF_SERVICE)]
    type_of_service: String,
}

impl ChannelArgs {
    fn authkey(&self) -> anyhow::Result<String> {
        self.authkey
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("--authkey (or CHANNEL_AUTHKEY) is required")
    }

    /// Hub client and payload, if every hub option is set.
    fn hub(&self) -> Option<(HubClient, Registration)> {
        let client = HubClient::new(self.hub_url.clone()?, self.hub_authkey.clone()?);
        let registration = Registration {
            name: self.name.clone(),
            endpoint: self.endpoint.clone()?,
            authkey: self.authkey.clone()?,
            type_of_service: self.type_of_service.clone(),
        };
        Some((client, registration))
    }
}

#[derive(Args, Clone)]
struct ServeArgs {
    #[command(flatten)]
    channel: ChannelArgs,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 5001)]
    port: u16,

    /// Which routes require the shared secret.
    #[arg(long, value_enum, default_value_t = AuthScope::WriteOnly)]
    auth_scope: AuthScope,

    #[arg(long, default_value_t = MAX_MESSAGES)]
    max_messages: usize,

    #[arg(long, default_value_t = MAX_AGE_SECONDS)]
    max_age_seconds: f64,

    /// JSON document holding the message history.
    #[arg(long, env = "CHANNEL_STORAGE", default_value = DEFAULT_STORAGE_PATH)]
    storage: PathBuf,
}

impl ServeArgs {
    fn channel_config(&self) -> anyhow::Result<ChannelConfig> {
        Ok(ChannelConfig {
            channel_name: self.channel.name.clone(),
            shared_secret: self.channel.authkey()?,
            auth_scope: self.auth_scope,
            max_messages: self.max_messages,
            max_age_seconds: self.max_age_seconds,
            storage_path: self.storage.clone(),
        })
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,calcwizard_channel=debug".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Register(args)) => register(args).await,
        Some(Command::Serve(args)) => serve(args).await,
        None => serve(cli.serve).await,
    }
}

async fn register(args: ChannelArgs) -> anyhow::Result<()> {
    args.authkey()?;
    let (hub, registration) = args
        .hub()
        .context("register needs --hub-url, --hub-authkey and --endpoint")?;
    hub.register(&registration).await?;
    info!(name = %registration.name, "channel registered");
    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.channel_config()?;
    info!(
        name = %config.channel_name,
        scope = ?config.auth_scope,
        max_messages = config.max_messages,
        max_age_seconds = config.max_age_seconds,
        storage = %config.storage_path.display(),
        "starting channel"
    );

    let service = Arc::new(ChannelService::open(config));
    let app = http::router(service);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("listening on {}", addr);

    if let Some((hub, registration)) = args.channel.hub() {
        tokio::spawn(async move {
            hub.register_best_effort(&registration).await;
        });
    }

    axum::serve(listener, app).await.context("server failed")
}
