use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

mod app;
mod auth;
mod http;
mod mcp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chronod_gateway=info,chronod_engine=info,tower_http=debug".into()
            }),
        )
        .init();

    // load config: explicit path > CHRONOD_CONFIG env > ~/.chronod/chronod.toml
    let config_path = std::env::var("CHRONOD_CONFIG").ok();
    let config = chronod_core::ChronodConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        chronod_core::ChronodConfig::default()
    });

    let data_dir = PathBuf::from(&config.data.dir);
    std::fs::create_dir_all(&data_dir)?;

    let db_path = data_dir.join(chronod_core::config::DB_FILE_NAME);
    info!(path = %db_path.display(), "opening SQLite database");

    let db = rusqlite::Connection::open(&db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    chronod_store::db::init_db(&db)?;
    info!("database migrations complete");

    let store = Arc::new(chronod_store::TaskStore::new(db));

    let retention = Duration::from_secs(config.logs.retention * 3600);
    let engine = chronod_engine::Engine::new(
        Arc::clone(&store),
        Box::new(chronod_engine::CronPlanner),
        &data_dir,
        retention,
    );

    // Live triggers + log janitor come up before the listener so nothing is
    // missed while the socket binds.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    engine.start(shutdown_rx);

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;
    let state = Arc::new(app::AppState {
        config,
        store,
        engine: engine.clone(),
        data_dir,
    });
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("chronod gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal janitor to stop and drop all live triggers
    let _ = shutdown_tx.send(true);
    engine.stop();
    Ok(())
}
