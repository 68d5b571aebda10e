//! gemini-proxy
//!
//! ```text
//!     Client Request                ┌──────────────────────────────────────────┐
//!     ──────────────────────────────┼─▶ request id ─▶ trace ─▶ identity ─▶ CORS│
//!                                   │                     │                    │
//!                                   │                     ▼                    │
//!                                   │   method / v1beta/ / x-goog-api-key      │
//!                                   │                     │                    │
//!                                   │                     ▼                    │
//!     Client Response               │   Forwarder (shared pooled client) ──────┼──▶ Upstream
//!     ◀─────────────────────────────┼── verbatim relay or JSON error ◀─────────┼───
//!                                   └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gemini_proxy::config::{self, ProxyConfig};
use gemini_proxy::http::HttpServer;
use gemini_proxy::lifecycle::{signals, Shutdown};
use gemini_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gemini-proxy")]
#[command(about = "Reverse proxy for the generative-language API", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the upstream base URL.
    #[arg(short, long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(upstream) = cli.upstream {
        config.upstream.base_url = upstream;
    }
    config::validation::validate_config(&config).map_err(config::ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!("gemini-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        timeout_secs = config.upstream.timeout_secs,
        auth_required = config.auth.require_for_proxy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
