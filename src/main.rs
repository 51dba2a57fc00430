//! pNode Monitor - analytics backend for a storage-node network
//!
//! Starts the REST server and the periodic refresh task.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pnode_monitor::api::{create_router, AppState};
use pnode_monitor::store::{JsonFileNodeStore, MemoryNodeStore, SharedStore};
use pnode_monitor::upstream::UpstreamClient;
use pnode_monitor::{spawn_refresh_task, Config, NodeService};

/// Main entry point for the pNode analytics server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the node store and build the upstream client
/// 4. Start the background refresh task
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pnode_monitor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!("Starting {} ({})", config.service_name, config.environment);
    info!(
        "Configuration loaded: upstream={} (enabled={}), mock={:?}, cache_ttl={:?}, port={}, refresh={:?}",
        config.upstream_base_url,
        config.upstream_enabled,
        config.mock_mode,
        config.cache_ttl,
        config.server_port,
        config.refresh_interval
    );

    let store: SharedStore = match &config.store_path {
        Some(path) => Arc::new(
            JsonFileNodeStore::open(path)
                .await
                .with_context(|| format!("failed to open node store at {path}"))?,
        ),
        None => {
            info!("STORE_PATH not set, persisting to memory only");
            Arc::new(MemoryNodeStore::new())
        }
    };

    let upstream =
        UpstreamClient::from_config(&config).context("failed to build upstream HTTP client")?;
    let service = Arc::new(NodeService::from_config(&config, Arc::new(upstream), store));

    let refresh_handle = if config.refresh_interval.is_zero() {
        info!("Background refresh disabled");
        None
    } else {
        Some(spawn_refresh_task(service.clone(), config.refresh_interval))
    };

    let app = create_router(AppState::new(service, &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(refresh_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the refresh
/// task.
async fn shutdown_signal(refresh_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = refresh_handle {
        handle.abort();
        warn!("Refresh task aborted");
    }
}
