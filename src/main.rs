mod api;
mod feed;
mod gateway;

use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use gateway::{BroadcastJob, BroadcastSchedule, Gateway, Scheduler, SessionCoordinator};
use iris_channels::LineChannel;
use iris_core::{
    clock::{Clock, SystemClock},
    config,
    traits::{Channel, Provider},
};
use iris_memory::{ContextStore, ReminderStore, SubscriberRegistry};
use iris_providers::OpenAiProvider;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "iris",
    version,
    about = "iris — LINE conversational gateway with scheduled notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway.
    Start,
    /// Check configuration and upstream availability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => start(&cli.config).await,
        Commands::Status => status(&cli.config).await,
    }
}

async fn start(config_path: &str) -> anyhow::Result<()> {
    let mut cfg = config::load(config_path)?;
    // Fail fast: no silent degraded mode when a credential is absent.
    cfg.resolve_credentials()?;

    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::from_config(cfg.completion.clone()));
    if !provider.is_available().await {
        anyhow::bail!("provider '{}' is not available", provider.name());
    }

    let channel: Arc<dyn Channel> = Arc::new(LineChannel::new(cfg.line.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let contexts = Arc::new(ContextStore::new(
        cfg.completion.system_prompt.clone(),
        cfg.memory.max_turns,
    ));
    let reminders = Arc::new(ReminderStore::new(cfg.scheduler.tick_secs));
    let subscribers = Arc::new(SubscriberRegistry::new());
    let news = Arc::new(feed::NewsClient::new(cfg.news.clone()));

    let scheduler = if cfg.scheduler.enabled {
        let mut scheduler = Scheduler::new(
            reminders.clone(),
            subscribers.clone(),
            channel.clone(),
            clock.clone(),
            cfg.scheduler.tick_secs,
        );
        if cfg.news.enabled {
            let digest_time = NaiveTime::parse_from_str(&cfg.news.digest_time, "%H:%M")
                .map_err(|e| anyhow::anyhow!("invalid news.digest_time: {e}"))?;
            scheduler.register_job(BroadcastJob {
                name: "news-digest".to_string(),
                schedule: BroadcastSchedule::Daily(digest_time),
                source: Arc::new(feed::NewsDigest::new(
                    news.clone(),
                    cfg.news.digest_category.clone(),
                )),
            });
        }
        Some(scheduler)
    } else {
        None
    };

    // Webhook events flow into the gateway through this queue.
    let (tx, rx) = mpsc::channel(256);
    let api_state = api::ApiState::new(cfg.line.channel_secret.clone(), tx);
    let server = tokio::spawn(api::serve(
        cfg.server.host.clone(),
        cfg.server.port,
        api_state,
    ));

    let coordinator = SessionCoordinator::new(
        contexts,
        provider.clone(),
        cfg.completion.fallback_reply.clone(),
    );
    let gw = Arc::new(Gateway::new(
        channel,
        coordinator,
        reminders,
        subscribers,
        news,
        clock,
    ));

    info!("iris starting | provider: {}", provider.name());
    gw.run(rx, scheduler).await?;

    server.abort();
    Ok(())
}

async fn status(config_path: &str) -> anyhow::Result<()> {
    let mut cfg = config::load(config_path)?;
    println!("iris — Status Check\n");
    println!("Config: {config_path}");

    match cfg.resolve_credentials() {
        Ok(()) => {
            let provider = OpenAiProvider::from_config(cfg.completion.clone());
            println!(
                "  completion: {}",
                if provider.is_available().await {
                    "available"
                } else {
                    "unreachable"
                }
            );
            println!("  line: configured");
            println!(
                "  news: {}",
                if cfg.news.enabled { "enabled" } else { "disabled" }
            );
            println!(
                "  scheduler: {} (tick {}s)",
                if cfg.scheduler.enabled { "enabled" } else { "disabled" },
                cfg.scheduler.tick_secs
            );
        }
        Err(e) => {
            println!("  credentials: {e}");
        }
    }

    Ok(())
}
