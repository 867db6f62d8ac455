//! Metrics collection and exposition.
//!
//! [`Exporter`] owns the exported state and performs one Icecast scrape per
//! collection request; [`PrometheusEncoder`] renders it in the Prometheus
//! text format.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use icecast_exporter::client::StatusClient;
//! use icecast_exporter::metrics::Exporter;
//!
//! # async fn run() -> Result<(), icecast_exporter::client::FetchError> {
//! let client = StatusClient::new(
//!     "http://localhost:8000/status-json.xsl",
//!     Duration::from_secs(5),
//! )?;
//! let exporter = Exporter::new(Arc::new(client));
//! let text = exporter.collect().await;
//! assert!(text.contains("icecast_up"));
//! # Ok(())
//! # }
//! ```

mod collector;
mod prometheus;

pub use collector::{
    DEFAULT_NAMESPACE, ExposedMetrics, Exporter, FETCH_FAILURES, JSON_PARSE_FAILURES, LISTENERS,
    LabelKey, PROCESS_START_TIME, SERVER_START, STREAM_START, TOTAL_SCRAPES, UP,
    process_start_time,
};
pub use prometheus::{CONTENT_TYPE, MetricDesc, MetricKind, PrometheusEncoder, format_value};
