//! Parser for the Icecast `status-json.xsl` document.
//!
//! Icecast reports its active mount points under `icestats.source`, but the
//! JSON type of that field depends on how many mounts are live: a list for
//! zero or several, a bare object for exactly one. [`parse`] accepts both and
//! hands back a single canonical [`UpstreamStatus`].
//!
//! # Example
//!
//! ```
//! let body = br#"{"icestats":{
//!     "server_start_iso8601":"2016-01-01T00:00:00+0000",
//!     "source":{"listeners":5,"listenurl":"/stream","server_type":"audio/mpeg",
//!               "stream_start_iso8601":"2016-01-01T01:00:00+0000"}}}"#;
//!
//! let status = icecast_status::parse(body).unwrap();
//! assert_eq!(status.sources.len(), 1);
//! assert_eq!(status.sources[0].listeners, 5);
//! ```

mod error;
mod model;
mod parse;
mod timestamp;

pub use error::ParseError;
pub use model::{SourceStat, UpstreamStatus};
pub use parse::{SourceShape, parse, parse_with_shape};
pub use timestamp::{ICECAST_TIMESTAMP_FORMAT, parse_timestamp};
