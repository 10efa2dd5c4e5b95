pub mod public;
pub mod trips;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{error::AppError, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .nest("/api", trips::router(state.config.enable_seed))
        .fallback(unknown_route)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn unknown_route() -> AppError {
    AppError::NotFound
}
