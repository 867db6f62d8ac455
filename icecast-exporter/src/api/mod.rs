//! HTTP server module.
//!
//! Serves the Prometheus metrics endpoint and a small landing page.

pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};
