//! Feedwatch dispatcher entry point.

use feedwatch_core::collection::Collection;
use feedwatch_dispatcher::app::Dispatcher;
use feedwatch_dispatcher::config::DispatcherConfig;
use feedwatch_dispatcher::error::AppError;
use feedwatch_dispatcher::telemetry;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv::dotenv().ok();
    telemetry::init();

    info!("Starting feedwatch dispatcher");

    let config = DispatcherConfig::from_env().inspect_err(|e| {
        error!(error = %e, "invalid configuration");
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    if config.database_migrate {
        feedwatch_store::migrate(&pool).await?;
        info!("database migrations applied");
    }

    let dispatcher = Dispatcher::from_config(&config, pool)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(async move { dispatcher.run(&Collection::ALL, shutdown_rx).await });

    shutdown_signal().await;
    info!("shutdown requested; finishing in-flight events");
    shutdown_tx.send_replace(true);

    if let Err(e) = running.await {
        error!(error = %e, "dispatcher task failed");
    }
    info!("feedwatch dispatcher stopped");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
