//! Icecast metrics collector.
//!
//! Owns the exposed metric state and runs one scrape per collection request.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use chrono::Utc;
use icecast_status::UpstreamStatus;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::prometheus::{MetricDesc, MetricKind, PrometheusEncoder};
use crate::client::StatusFetcher;
use crate::scrape::{self, ScrapeStage};

/// Namespace prefixed to every exported metric.
pub const DEFAULT_NAMESPACE: &str = "icecast";

const LABEL_NAMES: &[&str] = &["listenurl", "server_type"];

pub const UP: MetricDesc = MetricDesc {
    name: "up",
    help: "Was the last scrape of Icecast successful.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub const TOTAL_SCRAPES: MetricDesc = MetricDesc {
    name: "exporter_total_scrapes",
    help: "Current total Icecast scrapes.",
    kind: MetricKind::Counter,
    labels: &[],
};

pub const JSON_PARSE_FAILURES: MetricDesc = MetricDesc {
    name: "exporter_json_parse_failures",
    help: "Number of errors while parsing JSON.",
    kind: MetricKind::Counter,
    labels: &[],
};

pub const FETCH_FAILURES: MetricDesc = MetricDesc {
    name: "exporter_fetch_failures",
    help: "Number of errors while fetching the Icecast status document.",
    kind: MetricKind::Counter,
    labels: &[],
};

pub const SERVER_START: MetricDesc = MetricDesc {
    name: "server_start",
    help: "Timestamp of server startup.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub const LISTENERS: MetricDesc = MetricDesc {
    name: "listeners",
    help: "The number of currently connected listeners.",
    kind: MetricKind::Gauge,
    labels: LABEL_NAMES,
};

pub const STREAM_START: MetricDesc = MetricDesc {
    name: "stream_start",
    help: "Timestamp of when the currently active source client connected to this mount point.",
    kind: MetricKind::Gauge,
    labels: LABEL_NAMES,
};

/// Standard process metric; exported without the namespace prefix.
pub const PROCESS_START_TIME: MetricDesc = MetricDesc {
    name: "process_start_time_seconds",
    help: "Start time of the process since unix epoch in seconds.",
    kind: MetricKind::Gauge,
    labels: &[],
};

static DESCRIPTORS: [MetricDesc; 8] = [
    UP,
    TOTAL_SCRAPES,
    JSON_PARSE_FAILURES,
    FETCH_FAILURES,
    SERVER_START,
    LISTENERS,
    STREAM_START,
    PROCESS_START_TIME,
];

static PROCESS_START: OnceLock<i64> = OnceLock::new();

/// Unix seconds of the first call in this process.
///
/// Call early in `main` so the value reflects process startup.
pub fn process_start_time() -> i64 {
    *PROCESS_START.get_or_init(|| Utc::now().timestamp())
}

/// Series key: `(listenurl, server_type)`.
pub type LabelKey = (String, String);

/// Current values of every exported metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposedMetrics {
    pub up: bool,
    pub total_scrapes: u64,
    pub json_parse_failures: u64,
    pub fetch_failures: u64,
    /// Unix seconds; keeps the last successfully scraped value.
    pub server_start: i64,
    pub listeners: BTreeMap<LabelKey, u64>,
    pub stream_start: BTreeMap<LabelKey, i64>,
    /// Unix seconds.
    pub process_start_time: i64,
}

impl ExposedMetrics {
    fn reset_series(&mut self) {
        self.listeners.clear();
        self.stream_start.clear();
    }

    fn publish(&mut self, status: &UpstreamStatus) {
        self.up = true;
        self.server_start = status.server_start_unix();

        // Later sources with the same label pair overwrite earlier ones.
        for source in &status.sources {
            let key = (source.listen_url.clone(), source.server_type.clone());
            self.listeners.insert(key.clone(), source.listeners);
            self.stream_start.insert(key, source.stream_start_unix());
        }
    }

    fn record_failure(&mut self, stage: ScrapeStage) {
        self.up = false;
        match stage {
            ScrapeStage::Fetch => self.fetch_failures += 1,
            ScrapeStage::Parse => self.json_parse_failures += 1,
        }
    }

    /// Render in the Prometheus text format.
    pub fn render(&self, encoder: &PrometheusEncoder) -> String {
        let mut output = String::new();

        encoder.write_scalar(&mut output, &UP, if self.up { 1.0 } else { 0.0 });
        encoder.write_scalar(&mut output, &TOTAL_SCRAPES, self.total_scrapes as f64);
        encoder.write_scalar(
            &mut output,
            &JSON_PARSE_FAILURES,
            self.json_parse_failures as f64,
        );
        encoder.write_scalar(&mut output, &FETCH_FAILURES, self.fetch_failures as f64);
        encoder.write_scalar(&mut output, &SERVER_START, self.server_start as f64);

        encoder.write_vector(
            &mut output,
            &LISTENERS,
            self.listeners
                .iter()
                .map(|((url, server_type), count)| ([url.as_str(), server_type.as_str()], *count as f64)),
        );
        encoder.write_vector(
            &mut output,
            &STREAM_START,
            self.stream_start
                .iter()
                .map(|((url, server_type), ts)| ([url.as_str(), server_type.as_str()], *ts as f64)),
        );

        PrometheusEncoder::new("").write_scalar(
            &mut output,
            &PROCESS_START_TIME,
            self.process_start_time as f64,
        );

        output
    }
}

/// Scrapes Icecast on demand and exposes the result.
pub struct Exporter {
    fetcher: Arc<dyn StatusFetcher>,
    encoder: PrometheusEncoder,
    state: Mutex<ExposedMetrics>,
}

impl Exporter {
    /// Create an exporter using the default `icecast` namespace.
    pub fn new(fetcher: Arc<dyn StatusFetcher>) -> Self {
        Self::with_namespace(fetcher, DEFAULT_NAMESPACE)
    }

    /// Create an exporter with a custom namespace.
    pub fn with_namespace(fetcher: Arc<dyn StatusFetcher>, namespace: impl Into<String>) -> Self {
        Self {
            fetcher,
            encoder: PrometheusEncoder::new(namespace),
            state: Mutex::new(ExposedMetrics {
                process_start_time: process_start_time(),
                ..ExposedMetrics::default()
            }),
        }
    }

    /// Every metric this exporter can emit. Does not touch the scrape state.
    pub fn describe() -> &'static [MetricDesc] {
        &DESCRIPTORS
    }

    pub fn encoder(&self) -> &PrometheusEncoder {
        &self.encoder
    }

    /// Run one scrape cycle and render the resulting metrics.
    ///
    /// Concurrent calls are serialized; each caller sees the snapshot its own
    /// scrape produced.
    pub async fn collect(&self) -> String {
        let mut state = self.state.lock().await;
        let started = Instant::now();

        state.reset_series();
        state.total_scrapes += 1;

        match scrape::run_cycle(self.fetcher.as_ref()).await {
            Ok(status) => {
                state.publish(&status);
                debug!(
                    uri = self.fetcher.target(),
                    sources = status.sources.len(),
                    series = state.listeners.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Scrape succeeded"
                );
            }
            Err(e) => {
                state.record_failure(e.stage());
                error!(
                    uri = self.fetcher.target(),
                    stage = %e.stage(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Scrape failed"
                );
            }
        }

        state.render(&self.encoder)
    }

    /// Copy of the current metric state.
    pub async fn snapshot(&self) -> ExposedMetrics {
        self.state.lock().await.clone()
    }
}
