//! rankscope-ai - SEO competitor analysis service
//!
//! Serves `POST /analyze`, `GET /analyze/events` and `GET /health`.
//! Configuration comes from a bootstrap TOML file overlaid with environment
//! variables; see `rankscope_ai::config`.

use anyhow::{Context, Result};
use clap::Parser;
use rankscope_ai::api::health::BuildInfo;
use rankscope_ai::config::ServiceConfig;
use rankscope_common::config::load_bootstrap_config;
use rankscope_common::events::EventBus;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for rankscope-ai
#[derive(Parser, Debug)]
#[command(name = "rankscope-ai")]
#[command(about = "Keyword competitor analysis and SEO recommendations")]
#[command(version)]
struct Args {
    /// Bootstrap TOML file (overrides RANKSCOPE_CONFIG and the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = load_bootstrap_config(args.config.as_deref())
        .context("Failed to load bootstrap configuration")?;
    let config = ServiceConfig::resolve(&toml);

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("rankscope_ai={0},tower_http={0}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let build = BuildInfo::current();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = build.git_hash,
        built = build.build_timestamp,
        profile = build.build_profile,
        "Starting rankscope-ai"
    );

    if config.providers.serpapi_api_key.is_none() {
        warn!("SERPAPI_API_KEY is not set; every analysis will fail at search");
    }
    if config.providers.anthropic_api_key.is_none() && config.providers.openai_api_key.is_none() {
        warn!("No model provider key is set; every analysis will fail");
    }

    let event_bus = EventBus::new(100);
    let state = rankscope_ai::build_state(&config, event_bus)
        .context("Failed to initialize analysis pipeline")?;
    let app = rankscope_ai::build_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
