//! HTTP client for the Icecast status endpoint.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

/// User agent sent with every status request.
pub const USER_AGENT: &str = concat!("icecast-exporter/", env!("CARGO_PKG_VERSION"));

/// Failure to retrieve the status document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {uri} failed: {source}")]
    Request {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{uri} returned HTTP {status}")]
    Status { uri: String, status: StatusCode },
}

impl FetchError {
    /// Whether the request ran into the configured timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Request { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Source of raw status documents.
///
/// [`StatusClient`] is the production implementation; the seam exists so the
/// exporter can be driven without a live Icecast server.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// The location being scraped, used for logging.
    fn target(&self) -> &str;

    /// Retrieve one status document.
    async fn fetch(&self) -> Result<Bytes, FetchError>;
}

/// Fetches `status-json.xsl` over HTTP with a hard deadline.
#[derive(Debug, Clone)]
pub struct StatusClient {
    uri: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl StatusClient {
    /// Create a client for `uri`.
    ///
    /// `timeout` bounds both connection establishment and the whole request
    /// including the body read.
    pub fn new(uri: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Build)?;

        Ok(Self {
            uri: uri.into(),
            timeout,
            client,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request_error(&self, source: reqwest::Error) -> FetchError {
        FetchError::Request {
            uri: self.uri.clone(),
            source,
        }
    }
}

#[async_trait]
impl StatusFetcher for StatusClient {
    fn target(&self) -> &str {
        &self.uri
    }

    async fn fetch(&self) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(&self.uri)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                uri: self.uri.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        debug!(uri = %self.uri, bytes = body.len(), "Fetched Icecast status");
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    enum Reply {
        Body(Bytes),
        Status(StatusCode),
    }

    /// In-memory fetcher whose reply can be swapped between calls.
    pub(crate) struct MockFetcher {
        reply: Mutex<Reply>,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        pub(crate) fn body(body: &str) -> Self {
            Self {
                reply: Mutex::new(Reply::Body(Bytes::copy_from_slice(body.as_bytes()))),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing(status: StatusCode) -> Self {
            Self {
                reply: Mutex::new(Reply::Status(status)),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn set_body(&self, body: &str) {
            *self.reply.lock().unwrap() = Reply::Body(Bytes::copy_from_slice(body.as_bytes()));
        }

        pub(crate) fn set_failure(&self, status: StatusCode) {
            *self.reply.lock().unwrap() = Reply::Status(status);
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusFetcher for MockFetcher {
        fn target(&self) -> &str {
            "mock://icecast/status-json.xsl"
        }

        async fn fetch(&self) -> Result<Bytes, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &*self.reply.lock().unwrap() {
                Reply::Body(body) => Ok(body.clone()),
                Reply::Status(status) => Err(FetchError::Status {
                    uri: self.target().to_string(),
                    status: *status,
                }),
            }
        }
    }
}
