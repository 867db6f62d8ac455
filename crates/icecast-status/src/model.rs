//! Canonical form of one Icecast status document.

use chrono::{DateTime, FixedOffset};

/// Normalized result of one scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamStatus {
    /// When the Icecast server process started.
    pub server_start: DateTime<FixedOffset>,
    /// Active mount points, in document order.
    pub sources: Vec<SourceStat>,
}

impl UpstreamStatus {
    pub fn new(server_start: DateTime<FixedOffset>, sources: Vec<SourceStat>) -> Self {
        Self {
            server_start,
            sources,
        }
    }

    /// Server start as seconds since the unix epoch.
    pub fn server_start_unix(&self) -> i64 {
        self.server_start.timestamp()
    }
}

/// One active mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStat {
    /// Mount URL as reported by Icecast (`listenurl`).
    pub listen_url: String,
    /// Content type of the stream (`server_type`).
    pub server_type: String,
    /// Currently connected listeners.
    pub listeners: u64,
    /// When the source client connected to this mount.
    pub stream_start: DateTime<FixedOffset>,
}

impl SourceStat {
    /// The `(listenurl, server_type)` pair identifying this source's series.
    pub fn label_key(&self) -> (&str, &str) {
        (&self.listen_url, &self.server_type)
    }

    /// Stream start as seconds since the unix epoch.
    pub fn stream_start_unix(&self) -> i64 {
        self.stream_start.timestamp()
    }
}
