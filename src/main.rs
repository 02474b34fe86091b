use anyhow::{Context, Result};
use tracing::info;

use cam_relay::{config::Config, server::Server, util::init_log};

#[tokio::main]
async fn main() -> Result<()> {
    init_log();

    let config = Config::from_env()?;
    info!("Starting camera relay on port {}", config.port);

    let server = Server::bind(config)
        .await
        .context("starting the relay server")?;
    server.run(shutdown_signal()).await?;

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Listening for Ctrl-C failed: {}", e);
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
                tracing::warn!("Listening for SIGTERM failed: {}", e);
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

    info!("Shutdown signal received");
}
