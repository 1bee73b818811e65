//! ETL Server - Main entry point

use anyhow::Result;
use etl_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use etl_server::{
    api,
    auth::HttpIdentityClient,
    config::{Config, QueueMode},
    db::{self, EntityStore, PgStore},
    features::FeatureState,
    pipeline::{PipelineWorker, ResourceReader},
    queue::{self, InlineDispatcher, JobDispatcher, JobScheduler, QueueDispatcher},
    storage::S3Storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("etl-server")
        .filter_directives("etl_server=debug,tower_http=debug,sqlx=warn,apalis=info")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    info!("Starting ETL Server");

    let config = Config::load()?;
    config.validate_for_server()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database).await?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    info!("Database migrations completed");

    let store = PgStore::new(db_pool.clone(), &config.database.user_role);
    let objects = Arc::new(S3Storage::new(config.storage.clone()));
    info!(bucket = objects.bucket(), "Object storage client initialized");

    let worker = Arc::new(PipelineWorker::new(
        Arc::new(store.clone()),
        objects,
        ResourceReader::new().with_limit(config.queue.max_asset_bytes),
    ));

    let mut _scheduler_handle = None;
    let dispatcher: Arc<dyn JobDispatcher> = match config.queue.mode {
        QueueMode::Inline => {
            info!("Queue mode: inline, pipeline runs in-process");
            Arc::new(InlineDispatcher::new(worker))
        },
        QueueMode::Queue => {
            let queue_pool =
                queue::connect_queue(&config.queue, &config.database, &db_pool).await?;
            queue::setup_queue(&queue_pool).await?;

            if config.queue.worker_enabled {
                info!("Embedded queue worker enabled");
                let handle = JobScheduler::new(queue_pool.clone(), worker).start().await?;
                _scheduler_handle = Some(handle);
            } else {
                info!("Embedded queue worker disabled (WORKER_ENABLED=false)");
            }

            Arc::new(QueueDispatcher::new(&queue_pool))
        },
    };

    let state = FeatureState {
        store: Arc::new(store) as Arc<dyn EntityStore>,
        dispatcher,
        identity: Arc::new(HttpIdentityClient::new(&config.auth)?),
    };

    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
