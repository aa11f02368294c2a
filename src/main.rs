use toolscout::builtin::register_builtin_tools;
use toolscout::catalog::Catalog;
use toolscout::config::Config;
use toolscout::handlers;
use toolscout::ingestion::{load_manifest, register_manifest};
use toolscout::state::AppState;

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolscout=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting toolscout discovery and execution service");

    let config = Config::from_env()?;
    let shutdown_timeout = config.shutdown_timeout_secs;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    // Set up Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    let catalog = build_catalog(&config)?;

    let start = std::time::Instant::now();
    let state = Arc::new(AppState::new(config, catalog, None)?);
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        strategy = state.discovery.strategy_name(),
        "State initialized",
    );

    if let Some(upgrade) = state.start_ranking_upgrade() {
        tokio::spawn(async move {
            if let Ok(outcome) = upgrade.await {
                tracing::info!(?outcome, "Background ranking upgrade finished");
            }
        });
    }

    let app = handlers::router(Arc::clone(&state))
        .route(
            "/metrics",
            get(move || {
                let handle = prometheus_handle.clone();
                async move { handle.render() }
            }),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    let shutdown = state.shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .into_future();

    // In-flight requests observe the cancelled token and finish early; the
    // drain timeout bounds anything that does not.
    let drain_deadline = async {
        shutdown.cancelled().await;
        tracing::info!(timeout_secs = shutdown_timeout, "Draining connections...");
        tokio::time::sleep(Duration::from_secs(shutdown_timeout)).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::warn!("Drain timeout elapsed, forcing shutdown");
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Builtin tools plus everything listed in the optional manifest.
fn build_catalog(config: &Config) -> anyhow::Result<Catalog> {
    let mut catalog = Catalog::new();
    register_builtin_tools(&mut catalog)?;

    if let Some(path) = &config.tools_path {
        let manifest = load_manifest(path)?;
        let registered = register_manifest(&mut catalog, &manifest);
        tracing::info!(path = %path.display(), registered, "Manifest tools registered");

        for (server, entry) in &manifest.servers {
            if entry.enabled && !catalog.has_executor(server) {
                tracing::warn!(
                    server = %server,
                    "No executor connected; tools are discoverable but calls will report executor_not_found"
                );
            }
        }
    }

    tracing::info!(tool_count = catalog.len(), "Catalog populated");
    Ok(catalog)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM), then cancel `shutdown` so
/// in-flight tool calls stop.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    shutdown.cancel();
}
