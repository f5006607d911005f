//! postbot-cli — operator tool for postbot
//!
//! # Subcommands
//! - `history show --job <job>`          — print the stored topic history
//! - `history clear --job <job>`         — delete the stored history
//! - `history record --job <job> <text>` — record a post's dedup key by hand
//! - `dedup-key <text> [--delimiters]`   — show the key a text would be stored under
//! - `invoke [--job <job>] [--event]`    — run one invocation locally

use anyhow::Context;
use clap::{Parser, Subcommand};
use postbot_core::{
    extract_dedup_key, history::storable_key, HistoryConfig, Job, PostbotConfig,
    SsmParameterStore, TopicHistory,
};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use postbot_lambda::JobContext;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "postbot-cli", version, about = "Operator CLI for postbot")]
struct Cli {
    #[arg(short, long, env = "POSTBOT_CONFIG", default_value = "postbot.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or edit a job's topic history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Print the dedup key extracted from a text
    DedupKey {
        text: String,

        /// Delimiter characters (defaults to the random fact job's set)
        #[arg(long)]
        delimiters: Option<String>,
    },

    /// Run a single invocation and print the scheduler response
    Invoke {
        /// Job to run (defaults to service.job)
        #[arg(long)]
        job: Option<Job>,

        /// Raw event JSON passed to the handler
        #[arg(long, default_value = "{}")]
        event: String,
    },
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    Show {
        #[arg(long)]
        job: Job,
    },
    Clear {
        #[arg(long)]
        job: Job,
    },
    Record {
        #[arg(long)]
        job: Job,
        text: String,
    },
}

// ============================================================================
// Commands
// ============================================================================

fn history_config(config: &PostbotConfig, job: Job) -> anyhow::Result<HistoryConfig> {
    config
        .history_for(job)
        .cloned()
        .with_context(|| format!("job {} keeps no topic history", job))
}

/// Key `text` would be stored under. Delimiters default to the random fact
/// job's set.
fn dedup_key(config: &PostbotConfig, text: &str, delimiters: Option<&str>) -> String {
    let delimiters: Vec<char> = match delimiters {
        Some(d) => d.chars().collect(),
        None => config.random_fact.history.delimiter_chars(),
    };
    storable_key(extract_dedup_key(text, &delimiters))
}

async fn run_history(config: &PostbotConfig, action: HistoryAction) -> anyhow::Result<()> {
    let store = Arc::new(SsmParameterStore::from_config(&config.aws)?);

    match action {
        HistoryAction::Show { job } => {
            let history = TopicHistory::from_config(store, &history_config(config, job)?);
            let topics = history.load().await?;
            if topics.is_empty() {
                println!("No history stored at {}", history.parameter());
            }
            for (i, topic) in topics.iter().enumerate() {
                println!("{:>2}. {}", i + 1, topic);
            }
        }
        HistoryAction::Clear { job } => {
            let history = TopicHistory::from_config(store, &history_config(config, job)?);
            history.clear().await?;
            println!("Cleared {}", history.parameter());
        }
        HistoryAction::Record { job, text } => {
            let history = TopicHistory::from_config(store, &history_config(config, job)?);
            let topics = history.load().await?;
            match history.remember(&text, &topics) {
                Some(updated) => {
                    history.persist(&updated).await?;
                    println!(
                        "Recorded \"{}\" ({} entries)",
                        storable_key(history.dedup_key(&text)),
                        updated.len()
                    );
                }
                None => println!("Nothing recorded: key is blank or already present"),
            }
        }
    }
    Ok(())
}

async fn run_invoke(mut config: PostbotConfig, job: Option<Job>, event: &str) -> anyhow::Result<()> {
    if let Some(job) = job {
        config.service.job = job;
    }
    let event: serde_json::Value = serde_json::from_str(event).context("event is not valid JSON")?;
    let store = SsmParameterStore::from_config(&config.aws)?;
    let ctx = JobContext::new(config, Arc::new(store));

    let response = postbot_lambda::handle_invocation(&event, &ctx).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.status_code != 200 {
        std::process::exit(1);
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = PostbotConfig::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config))?;
    tracing::debug!(path = %cli.config, job = %config.service.job, "Loaded config");

    match cli.command {
        Commands::History { action } => run_history(&config, action).await,
        Commands::DedupKey { text, delimiters } => {
            println!("{}", dedup_key(&config, &text, delimiters.as_deref()));
            Ok(())
        }
        Commands::Invoke { job, event } => run_invoke(config, job, &event).await,
    }
}

// ============================================================================
// Tests
// ============================================================================
