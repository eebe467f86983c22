use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tokio::signal;
use tower_sessions::ExpiredDeletion;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use courtside::config::AppConfig;
use courtside::migration::Migrator;
use courtside::models::{TennisSessionModel, UserModel};
use courtside::store::SeaOrmStore;
use courtside::templates::{Helpers, TemplateCache};
use courtside::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cfg = AppConfig::load().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter)))
        .init();

    let settings = cfg.session_settings().context("invalid session settings")?;

    let mut opt = ConnectOptions::new(cfg.database_url.clone());
    opt.max_connections(10)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(10))
        .max_lifetime(Duration::from_secs(10 * 60))
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .context("failed to connect to the database")?;
    info!("connected to database");

    Migrator::up(&db, None)
        .await
        .context("failed to run migrations")?;

    let templates = TemplateCache::build(&cfg.templates_dir, &Helpers::standard())
        .context("failed to build the template cache")?;

    let store = SeaOrmStore::new(db.clone());
    tokio::spawn(sweep_expired_sessions(store.clone(), cfg.cleanup_interval()));

    let state = AppState::new(
        Arc::new(UserModel::new(db.clone())),
        Arc::new(TennisSessionModel::new(db)),
        Arc::new(templates),
    );
    let app = web::app(state, store, &settings, &cfg.static_dir);

    let listener = tokio::net::TcpListener::bind(cfg.addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.addr))?;
    info!(addr = %cfg.addr, "starting server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn sweep_expired_sessions(store: SeaOrmStore, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if let Err(err) = store.delete_expired().await {
            error!(error = %err, "failed to delete expired sessions");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
