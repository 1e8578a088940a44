use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use crate::config::{AppConfig, ConfigStore};
use crate::handlers::{self, AppState};

pub async fn handle(mut app: AppConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        app.server.host = host;
    }
    if let Some(port) = port {
        app.server.port = port;
    }

    tracing::info!("Starting exam gateway in {:?} mode", app.environment);

    let store = ConfigStore::load(&app)
        .with_context(|| format!("failed to load gateway config {}", app.gateway_file.display()))?;
    let store = Arc::new(store);

    let state = AppState::with_http_upstream(&app, Arc::clone(&store))?;
    let router = handlers::router(state, &app.security);

    let bind_addr = app.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        addr = %bind_addr,
        upstream_timeout_secs = app.upstream.timeout_secs,
        "Exam gateway listening"
    );

    reload_on_hangup(Arc::clone(&store));

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Exam gateway stopped");
    Ok(())
}

#[cfg(unix)]
fn reload_on_hangup(store: Arc<ConfigStore>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("SIGHUP reload disabled: {}", e);
                return;
            }
        };

        while hangup.recv().await.is_some() {
            if let Err(e) = store.reload() {
                tracing::error!(
                    version = store.snapshot().version,
                    error = %e,
                    "Gateway config reload failed; keeping current snapshot"
                );
            }
        }
    });
}

#[cfg(not(unix))]
fn reload_on_hangup(_store: Arc<ConfigStore>) {}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}
