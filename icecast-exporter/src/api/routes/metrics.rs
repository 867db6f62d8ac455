//! Metrics route.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::api::server::AppState;
use crate::metrics::CONTENT_TYPE;

/// Scrape Icecast and return the exposition text.
///
/// Scrape failures are reported through `icecast_up`, so this always
/// answers 200.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.exporter.collect().await;
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}
