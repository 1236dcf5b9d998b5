use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use skillswap_config::AppConfig;
use skillswap_database::{prepare_database, run_migrations, Repositories};
use skillswap_gateway::{create_router, GatewayState};
use skillswap_jobs::{spawn_worker, JobQueue, JobWorker};
use skillswap_realtime::{ConnectionManager, FanoutGateway};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long shutdown waits for queued jobs to finish.
const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Long-lived services shared by the HTTP server and the job worker.
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub repos: Repositories,
    pub connections: Arc<ConnectionManager>,
    pub fanout: FanoutGateway,
    pub jobs: JobQueue,
    worker: JoinHandle<()>,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = prepare_database(&config.database)
            .await
            .context("failed to connect to database")?;
        run_migrations(&db_pool).await?;

        let repos = Repositories::new(db_pool.clone());
        let seeded = repos
            .achievements
            .seed_catalogue()
            .await
            .context("failed to seed achievement catalogue")?;
        if seeded > 0 {
            info!(seeded, "achievement catalogue seeded");
        }

        let connections = Arc::new(ConnectionManager::new(config.realtime.outbound_buffer));
        let fanout = FanoutGateway::new(connections.clone());
        let worker = JobWorker::new(repos.clone(), fanout.clone(), config.jobs.clone());
        let (jobs, worker) = spawn_worker(worker, config.jobs.queue_capacity);

        info!(
            queue_capacity = config.jobs.queue_capacity,
            authorize_joins = config.realtime.authorize_joins,
            "realtime services ready"
        );

        Ok(Self {
            db_pool,
            repos,
            connections,
            fanout,
            jobs,
            worker,
        })
    }

    pub fn gateway_state(&self, config: &AppConfig) -> GatewayState {
        GatewayState::new(
            config,
            self.repos.clone(),
            self.connections.clone(),
            self.jobs.clone(),
        )
    }

    pub fn router(&self, config: &AppConfig) -> Router {
        create_router(self.gateway_state(config))
    }

    /// Stop accepting jobs, let the worker drain what is queued and close the pool.
    ///
    /// Routers built from these services hold queue handles of their own and must
    /// be dropped first, otherwise the drain runs into the timeout.
    pub async fn shutdown(self) {
        let Self {
            db_pool,
            jobs,
            worker,
            ..
        } = self;

        drop(jobs);
        if tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await.is_err() {
            warn!("job worker did not drain before shutdown");
        }
        db_pool.close().await;
        info!("backend services stopped");
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
