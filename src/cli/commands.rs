//! CLI command definitions and handlers

use clap::Subcommand;
use tracing::info;

use crate::core::gateway::Gateway;
use crate::core::models::TranslationRequest;

/// Commands for the translation gateway
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP API server
    Serve {
        /// Bind address (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Listen port (default: 8000)
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },

    /// Translate a single piece of text
    Translate {
        /// Text to translate
        text: String,

        /// Source language (auto-detect if not specified)
        #[arg(long = "from")]
        source_lang: Option<String>,

        /// Target language
        #[arg(short, long = "to")]
        target_lang: String,
    },

    /// Show provider status
    Status {
        /// Include timestamps and last errors
        #[arg(long)]
        detailed: bool,
    },

    /// Check one provider with a fixed phrase
    TestProvider {
        /// Provider id (google, deepl, microsoft, libretranslate)
        provider: String,
    },
}

/// Handle server command
pub async fn handle_serve(gateway: Gateway, host: String, port: u16) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    info!("Starting HTTP server on {}:{}", host, port);
    println!("🚀 Server starting on http://{}:{}", host, port);

    run_server(gateway, host, port).await?;

    Ok(())
}

/// Handle translate command
pub async fn handle_translate(
    gateway: Gateway,
    text: String,
    source_lang: Option<String>,
    target_lang: String,
) -> anyhow::Result<()> {
    let mut request = TranslationRequest::new(text, target_lang);
    if let Some(source_lang) = source_lang {
        request = request.with_source_lang(source_lang);
    }

    let translation = gateway.translate(&request).await?;
    println!("{}", translation);

    Ok(())
}

/// Handle status command
pub async fn handle_status(gateway: Gateway, detailed: bool) -> anyhow::Result<()> {
    if detailed {
        let status = gateway.detailed_service_status().await;
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        for (provider, status) in gateway.service_status().await {
            println!("{:<16} {}", provider, status);
        }
    }

    let stats = gateway.request_stats().await;
    println!(
        "\nRequests in window: {}/{} ({}s)",
        stats.total_requests_in_window, stats.max_requests, stats.window_secs
    );

    Ok(())
}

/// Handle test-provider command
pub async fn handle_test_provider(gateway: Gateway, provider: String) -> anyhow::Result<()> {
    info!("Testing provider {}", provider);

    let outcome = gateway.test_provider(&provider).await;
    match (outcome.success, outcome.result, outcome.error) {
        (true, Some(result), _) => println!("✅ {}: {}", provider, result),
        (_, _, error) => {
            anyhow::bail!(
                "{} failed: {}",
                provider,
                error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
    }

    Ok(())
}
