use std::sync::Arc;

use carpool::config::AppConfig;
use carpool::db::{init_pool, run_migrations};
use carpool::error::AppError;
use carpool::routes::create_router;
use carpool::services::sqlite_store::SqliteStore;
use carpool::state::AppState;
use tokio::net::TcpListener;
use tracing::{info, warn};

const TRIPS_COLLECTION: &str = "trips";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    if config.enable_seed {
        warn!("ENABLE_SEED is on: POST /api/trips/seed wipes all trips, never enable in production");
    }

    let store = SqliteStore::new(db.clone(), TRIPS_COLLECTION);
    let state = AppState::new(config.clone(), Arc::new(store));

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,carpool=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
