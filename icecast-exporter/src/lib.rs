//! icecast-exporter library crate.
//!
//! Scrapes an Icecast server's `status-json.xsl` on every metrics request and
//! republishes the result in the Prometheus text exposition format.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod scrape;

pub use error::{Error, Result};
