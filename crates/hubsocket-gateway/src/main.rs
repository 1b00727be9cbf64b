//! hubSocket gateway binary.
//!
//! - WebSocket endpoint: /v1/ws (one connection per socket, id pushed on accept)
//! - Built-in hubs: EchoHub, ChatHub, CounterHub
//! - Ops: /healthz, /readyz, /metrics
//! - Graceful shutdown: readiness flips to 503, live connections are closed
//!   (running `OnDisconnected`), then the listener stops

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hubsocket_core::error::{HubSocketError, Result};
use hubsocket_gateway::{app_state::AppState, config, hub::HubRegistry, hubs, router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "hubsocket-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg.gateway.listen.parse().map_err(|e| {
        HubSocketError::BadRequest(format!("gateway.listen must be a valid SocketAddr: {e}"))
    })?;
    let drain_grace = Duration::from_millis(cfg.gateway.drain_grace_ms);

    let mut hub_registry = HubRegistry::new();
    hubs::register_builtin(&mut hub_registry)?;

    let state = AppState::new(cfg, hub_registry)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "hubsocket-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| HubSocketError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state, drain_grace))
        .await
        .map_err(|e| HubSocketError::Internal(format!("server failed: {e}")))?;

    tracing::info!("hubsocket-gateway stopped");
    Ok(())
}

async fn shutdown_signal(state: AppState, drain_grace: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    state.set_draining();
    tracing::info!(
        grace_ms = drain_grace.as_millis() as u64,
        connections = state.registry().len(),
        "signal received, draining"
    );
    tokio::time::sleep(drain_grace).await;

    let left = state.close_connections(drain_grace).await;
    if left > 0 {
        tracing::warn!(connections = left, "connections still closing at shutdown");
    }
}
