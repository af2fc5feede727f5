use std::{env, process};

use tokio::{signal, sync::watch};
use tracing::{error, info};

use pubg_watch::{
    cli::Command, config::AppConfig, http::http_server::start_http_server, state::AppState,
    utils::logging::setup_logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = setup_logging("app/logs", "pubg-watch")?;

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        error!("❌ Error: Configuration path not provided. Usage: pubg-watch <config_path> [serve|run|clear-lock|clear-processed]");
        process::exit(1);
    }
    let command = match args.get(2).map(|c| c.parse::<Command>()) {
        Some(Ok(command)) => command,
        Some(Err(e)) => {
            error!("❌ {}", e);
            process::exit(1);
        }
        None => Command::default(),
    };

    let config = AppConfig::load(&args[1])?;
    let state = AppState::build(config).await?;

    match command {
        Command::Run => {
            let outcome = state.pipeline.run().await?;
            info!("🏁 Run finished: {:?}", outcome);
            return Ok(());
        }
        Command::ClearLock => {
            state.pipeline.clear_lock().await?;
            info!("🔓 Run lock cleared");
            return Ok(());
        }
        Command::ClearProcessed => {
            state.pipeline.clear_processed().await?;
            info!("🧹 Processed matches cleared");
            return Ok(());
        }
        Command::Serve => {}
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // 👇 Spawn Ctrl+C listener
    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if signal::ctrl_c().await.is_ok() {
                info!("🛑 Received Ctrl+C. Triggering shutdown...");
                let _ = shutdown_tx.send(());
            }
        }
    });

    let server = start_http_server(state, shutdown_rx).await?;

    // 👇 Catch any crash or panic
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("💥 Server crashed: {:?}", e);
            let _ = shutdown_tx.send(());
        }
        Err(e) => {
            error!("💥 Server task panicked: {:?}", e);
            let _ = shutdown_tx.send(());
        }
    }

    Ok(())
}
