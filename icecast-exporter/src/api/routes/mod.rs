//! Route modules.

pub mod index;
pub mod metrics;

use axum::{Router, routing::get};

use crate::api::server::AppState;

/// Create the router: metrics at the configured path, landing page elsewhere.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(&state.telemetry_path, get(metrics::metrics))
        .route("/", get(index::index))
        .fallback(index::index)
        .with_state(state)
}
