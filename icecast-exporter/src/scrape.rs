//! One fetch-then-parse scrape cycle.

use std::fmt;

use icecast_status::{ParseError, UpstreamStatus};
use thiserror::Error;
use tracing::debug;

use crate::client::{FetchError, StatusFetcher};

/// Stage of the scrape cycle a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeStage {
    Fetch,
    Parse,
}

impl fmt::Display for ScrapeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeStage::Fetch => write!(f, "fetch"),
            ScrapeStage::Parse => write!(f, "parse"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("can't scrape Icecast: {0}")]
    Fetch(#[from] FetchError),

    #[error("can't read JSON: {0}")]
    Parse(#[from] ParseError),
}

impl ScrapeError {
    pub fn stage(&self) -> ScrapeStage {
        match self {
            ScrapeError::Fetch(_) => ScrapeStage::Fetch,
            ScrapeError::Parse(_) => ScrapeStage::Parse,
        }
    }
}

/// Fetch the status document and normalize it.
pub async fn run_cycle<F>(fetcher: &F) -> Result<UpstreamStatus, ScrapeError>
where
    F: StatusFetcher + ?Sized,
{
    let body = fetcher.fetch().await?;
    let (status, shape) = icecast_status::parse_with_shape(&body)?;

    debug!(
        uri = fetcher.target(),
        %shape,
        sources = status.sources.len(),
        "Parsed Icecast status"
    );

    Ok(status)
}
