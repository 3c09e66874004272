use anyhow::Context;
use g4f_gate::config::ProxyConfig;
use g4f_gate::engine::HttpEngine;
use g4f_gate::server::{build_router, AppState};
use g4f_gate::util::{build_http_client, init_tracing};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ProxyConfig::from_env();
    let registry = config.load_registry()?;
    tracing::info!("Model registry loaded ({} models)", registry.len());
    tracing::info!("API key allow-set has {} keys", config.api_keys.len());

    let engine = HttpEngine::new(build_http_client(config.request_timeout), &config.engine_url)
        .with_api_key(config.engine_api_key.clone());
    tracing::info!("Completion engine: {}", engine.base_url());
    match config.request_timeout {
        Some(t) => tracing::info!("Request timeout: {}s", t.as_secs()),
        None => tracing::warn!("Request timeout disabled; a hung provider hangs its request"),
    }

    let state = AppState::new(registry, config.api_keys.clone(), Arc::new(engine))
        .with_timeout(config.request_timeout);
    let app = build_router(Arc::new(state));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("g4f-gate listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("g4f-gate stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    tracing::info!("Shutdown signal received");
}
