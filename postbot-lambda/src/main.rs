use clap::Parser;
use postbot_core::{Job, PostbotConfig, SsmParameterStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use postbot_lambda::{runtime, JobContext};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "POSTBOT_CONFIG", default_value = "postbot.toml")]
    config: String,

    /// Job to run when the event does not name one (overrides service.job)
    #[arg(long)]
    job: Option<Job>,

    /// Run a single invocation with an empty event and print the response
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (local runs; the Lambda environment sets real vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match PostbotConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };
    if let Some(job) = args.job {
        config.service.job = job;
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.service.log_level.as_str()));
    fmt().with_env_filter(filter).init();

    let store = match SsmParameterStore::from_config(&config.aws) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to set up parameter store: {}", e);
            std::process::exit(1);
        }
    };
    let ctx = JobContext::new(config, Arc::new(store));

    if args.once {
        let response = postbot_lambda::handle_invocation(&serde_json::json!({}), &ctx).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        if response.status_code != 200 {
            std::process::exit(1);
        }
        return Ok(());
    }

    let runtime = runtime::RuntimeClient::from_env()?;

    let (tx, rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = tx.send(());
    });

    runtime::run_runtime_loop(runtime, ctx, rx).await?;

    Ok(())
}
