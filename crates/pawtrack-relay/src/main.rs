//! PawTrack Model Relay
//!
//! Same-origin passthrough for model assets. The pet detector's model
//! hosts do not all allow cross-origin downloads, so the detector asks this
//! server for `/api/proxy-model?url=<target>` and receives the upstream
//! bytes with an open CORS policy and long-lived caching headers.
//!
//! The relay performs exactly one upstream request per call; retrying is
//! the model loader's job.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod relay;
mod routes;
mod security;

use config::RelayConfig;

#[derive(Parser, Debug)]
#[command(name = "pawtrack-relay")]
#[command(about = "PawTrack model relay", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "relay.yaml")]
    config: String,

    /// Listen address
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "PORT")]
    port: Option<u16>,

    /// User-Agent sent to model hosts
    #[arg(long)]
    user_agent: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long)]
    upstream_timeout: Option<u64>,

    /// Allow relaying to loopback and private addresses (development only)
    #[arg(long)]
    allow_local: bool,

    /// Restrict relayed hosts to this domain (repeatable)
    #[arg(long = "allowed-domain")]
    allowed_domain: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting PawTrack model relay");

    // Load configuration
    let config = RelayConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("User-Agent: {}", config.user_agent);
    info!("Upstream timeout: {}s", config.upstream_timeout_secs);
    if config.allow_local {
        warn!("Local and private targets are allowed; do not run this configuration in production");
    }

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    let state = relay::AppState::new(&config, metrics_handle)?;
    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Relay listening on http://{}{}", addr, routes::RELAY_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            warn!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("pawtrack=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pawtrack=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "pawtrack_relay_requests_total",
        "Total number of model relay requests"
    );
    metrics::describe_counter!(
        "pawtrack_relay_upstream_errors_total",
        "Relay requests whose upstream fetch failed or returned non-2xx"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
