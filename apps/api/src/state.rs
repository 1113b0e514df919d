use std::sync::Arc;

use crate::recommend::Recommender;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything behind it is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}
