//! mediadrop server - Main entry point

use anyhow::Result;
use mediadrop_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::{info, warn};

use mediadrop_server::{
    api::{create_router, AppState},
    config::Config,
    middleware,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("mediadrop-server")
        .filter_directives("mediadrop_server=debug,tower_http=debug")
        .build();

    // Environment variables take precedence
    let log_config = log_config.with_env()?;
    let _log_guard = init_logging(&log_config)?;

    info!("Starting mediadrop server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );
    info!(
        binary = %config.downloader.binary_path.display(),
        output_dir = %config.downloader.output_dir.display(),
        "Retrieval tool configured"
    );

    let state = AppState::from_config(&config)?;
    let app = create_router(state).layer(middleware::cors_layer(&config.cors));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        },
        _ = shutdown_signal() => {},
    }

    stop_tx.send(()).ok();

    // Give ongoing requests time to complete
    let timeout_secs = config.server.shutdown_timeout_secs;
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    match tokio::time::timeout(Duration::from_secs(timeout_secs), server).await {
        Ok(result) => {
            result??;
            info!("Server shut down gracefully");
        },
        Err(_) => warn!("Shutdown timed out with connections still open"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
