//! Main entry point for the translation gateway CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use translation_gateway::cli::commands::{self, Commands};
use translation_gateway::{CredentialStore, Gateway, GatewayConfig};

/// Translation Gateway - resilient multi-provider translation
#[derive(Parser, Debug)]
#[command(name = "translation-gateway", version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON or YAML); defaults to environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the rate-limit ceiling
    #[arg(long)]
    max_requests: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}={}", env!("CARGO_CRATE_NAME"), log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Credentials are re-read from the same source on every health check
    let (mut config, credentials) = match &args.config {
        Some(path) => (GatewayConfig::from_file(path)?, CredentialStore::from_file(path)?),
        None => (GatewayConfig::from_env()?, CredentialStore::from_env()),
    };
    if let Some(max_requests) = args.max_requests {
        config.rate_limit_max_requests = max_requests;
    }

    let Some(command) = args.command else {
        println!("Please specify a command. Use --help for more information.");
        return Ok(());
    };

    let gateway = Gateway::with_credentials(config, credentials)?;

    match command {
        Commands::Serve { host, port } => {
            commands::handle_serve(gateway, host, port).await?;
        }
        Commands::Translate {
            text,
            source_lang,
            target_lang,
        } => {
            commands::handle_translate(gateway, text, source_lang, target_lang).await?;
        }
        Commands::Status { detailed } => {
            commands::handle_status(gateway, detailed).await?;
        }
        Commands::TestProvider { provider } => {
            commands::handle_test_provider(gateway, provider).await?;
        }
    }

    Ok(())
}
