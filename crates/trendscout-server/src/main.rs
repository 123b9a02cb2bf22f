mod api;
mod middleware;
mod runs;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use trendscout_scraper::BestsellerSource;
use trendscout_trends::{PgProductStore, TrendService};

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
    runs::RunLock,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = trendscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = trendscout_db::PoolConfig::from_app_config(&config);
    let pool = trendscout_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = trendscout_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let sources = trendscout_core::load_sources(&config.sources_path)?;
    let source = Arc::new(BestsellerSource::from_config(&config, sources)?);
    let store = Arc::new(PgProductStore::new(pool.clone()));
    let service = Arc::new(TrendService::from_app_config(&config, store, source)?);
    let run_lock = RunLock::new();

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&service),
        run_lock.clone(),
        &config.cron,
    )
    .await?;

    if config.run_on_start {
        runs::queue_startup_scan(&pool, &service, &run_lock).await;
    }

    let auth = AuthState::new(
        &config.api_keys,
        matches!(config.env, trendscout_core::Environment::Development),
    )?;
    let app = build_app(
        AppState {
            pool,
            service,
            run_lock,
        },
        auth,
    );

    tracing::info!(addr = %config.bind_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
