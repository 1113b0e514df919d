pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommend::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/locations", get(handlers::handle_locations))
        .route(
            "/api/v1/recommendations",
            post(handlers::handle_recommend),
        )
        .with_state(state)
}
