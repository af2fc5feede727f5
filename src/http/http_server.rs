use crate::cron::start_cron_jobs;
use crate::{http::routes::create_routes, state::AppState};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::watch, task::JoinHandle};
use tracing::info;

pub async fn start_http_server(
    app_state: Arc<AppState>,
    shutdown_rx: watch::Receiver<()>,
) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
    let config = &app_state.config;
    let http_addr = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(http_addr.clone()).await?;
    info!("🚀 Starting PUBG-WATCH server on {:?}", http_addr);

    if config.cron.enabled {
        let scheduler = start_cron_jobs(app_state.clone()).await?;
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut scheduler = scheduler;
            shutdown_rx.changed().await.ok();
            if let Err(e) = scheduler.shutdown().await {
                tracing::error!("❌ Failed to stop cron scheduler: {:?}", e);
            }
        });
    } else {
        info!("📅 In-process cron disabled, waiting for external triggers");
    }

    let http_server = tokio::spawn(run_http_server(listener, shutdown_rx, app_state));

    Ok(http_server)
}

pub async fn run_http_server(
    listener: TcpListener,
    mut shutdown_rx: watch::Receiver<()>,
    app_state: Arc<AppState>,
) -> anyhow::Result<()> {
    let app = create_routes(app_state);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_rx.changed().await.ok();
            tracing::info!("🚦 Gracefully shutting down all connections, ");
        })
        .await?;

    Ok(())
}
