//! Dual-shape decoding of `status-json.xsl`.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use tracing::trace;

use crate::error::ParseError;
use crate::model::{SourceStat, UpstreamStatus};
use crate::timestamp::deserialize_timestamp;

/// Which JSON type `icestats.source` had in the decoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// A list of sources (zero or several mounts), or no `source` at all.
    List,
    /// A bare object (exactly one mount).
    Single,
}

impl fmt::Display for SourceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceShape::List => write!(f, "list"),
            SourceShape::Single => write!(f, "single"),
        }
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>"))]
struct StatusDocument<S> {
    icestats: IceStats<S>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>"))]
struct IceStats<S> {
    #[serde(rename = "server_start_iso8601", deserialize_with = "deserialize_timestamp")]
    server_start: DateTime<FixedOffset>,
    // Icecast leaves `source` out entirely when nothing is mounted.
    #[serde(default)]
    source: Option<S>,
}

#[derive(Deserialize)]
struct RawSource {
    listeners: u64,
    #[serde(rename = "listenurl")]
    listen_url: String,
    server_type: String,
    #[serde(rename = "stream_start_iso8601", deserialize_with = "deserialize_timestamp")]
    stream_start: DateTime<FixedOffset>,
}

impl From<RawSource> for SourceStat {
    fn from(raw: RawSource) -> Self {
        Self {
            listen_url: raw.listen_url,
            server_type: raw.server_type,
            listeners: raw.listeners,
            stream_start: raw.stream_start,
        }
    }
}

/// Parse a status document into its canonical form.
pub fn parse(bytes: &[u8]) -> Result<UpstreamStatus, ParseError> {
    parse_with_shape(bytes).map(|(status, _)| status)
}

/// Parse a status document, also reporting which `source` shape matched.
///
/// The list shape is always attempted first. Any failure of that attempt,
/// whatever its cause, falls through to the single-object attempt; only when
/// both fail is the document rejected.
pub fn parse_with_shape(bytes: &[u8]) -> Result<(UpstreamStatus, SourceShape), ParseError> {
    let as_list = match serde_json::from_slice::<StatusDocument<Vec<RawSource>>>(bytes) {
        Ok(doc) => {
            let IceStats {
                server_start,
                source,
            } = doc.icestats;
            let sources = source
                .unwrap_or_default()
                .into_iter()
                .map(SourceStat::from)
                .collect();
            return Ok((UpstreamStatus::new(server_start, sources), SourceShape::List));
        }
        Err(e) => e,
    };

    trace!(error = %as_list, "list shape rejected, retrying as single source");

    match serde_json::from_slice::<StatusDocument<RawSource>>(bytes) {
        Ok(doc) => {
            let IceStats {
                server_start,
                source,
            } = doc.icestats;
            let sources = source.into_iter().map(SourceStat::from).collect();
            Ok((
                UpstreamStatus::new(server_start, sources),
                SourceShape::Single,
            ))
        }
        Err(as_object) => Err(ParseError::UnrecognizedShape { as_list, as_object }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SINGLE: &str = r#"{"icestats":{"server_start_iso8601":"2016-01-01T00:00:00+0000","source":{"listeners":5,"listenurl":"/stream","server_type":"audio/mpeg","stream_start_iso8601":"2016-01-01T01:00:00+0000"}}}"#;

    fn source_json(listeners: u64, url: &str, server_type: &str) -> String {
        format!(
            r#"{{"listeners":{listeners},"listenurl":"{url}","server_type":"{server_type}","stream_start_iso8601":"2016-01-01T01:00:00+0000","title":"ignored"}}"#
        )
    }

    fn list_document(sources: &[String]) -> String {
        format!(
            r#"{{"icestats":{{"admin":"icemaster@localhost","server_start_iso8601":"2016-01-01T00:00:00+0000","source":[{}]}}}}"#,
            sources.join(",")
        )
    }

    #[test]
    fn parses_single_source_object() {
        let (status, shape) = parse_with_shape(SINGLE.as_bytes()).unwrap();

        assert_eq!(shape, SourceShape::Single);
        assert_eq!(status.server_start_unix(), 1_451_606_400);
        assert_eq!(status.sources.len(), 1);

        let source = &status.sources[0];
        assert_eq!(source.listen_url, "/stream");
        assert_eq!(source.server_type, "audio/mpeg");
        assert_eq!(source.listeners, 5);
        assert_eq!(source.stream_start_unix(), 1_451_610_000);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    fn list_yields_one_entry_per_source(#[case] count: usize) {
        let sources: Vec<String> = (0..count)
            .map(|i| source_json(i as u64 * 3, &format!("/mount{i}"), "audio/ogg"))
            .collect();
        let (status, shape) = parse_with_shape(list_document(&sources).as_bytes()).unwrap();

        assert_eq!(shape, SourceShape::List);
        assert_eq!(status.sources.len(), count);
        for (i, source) in status.sources.iter().enumerate() {
            assert_eq!(source.listen_url, format!("/mount{i}"));
            assert_eq!(source.server_type, "audio/ogg");
            assert_eq!(source.listeners, i as u64 * 3);
        }
    }

    #[test]
    fn single_object_matches_one_element_list() {
        let single = parse(SINGLE.as_bytes()).unwrap();
        let wrapped = list_document(&[source_json(5, "/stream", "audio/mpeg")]);
        let list = parse(wrapped.as_bytes()).unwrap();

        assert_eq!(single, list);
    }

    #[test]
    fn duplicate_label_pairs_are_kept_in_order() {
        let doc = list_document(&[
            source_json(1, "/a", "audio/mpeg"),
            source_json(2, "/a", "audio/mpeg"),
        ]);
        let status = parse(doc.as_bytes()).unwrap();

        assert_eq!(status.sources.len(), 2);
        assert_eq!(status.sources[1].label_key(), ("/a", "audio/mpeg"));
        assert_eq!(status.sources[1].listeners, 2);
    }

    #[rstest]
    #[case::missing_source(r#"{"icestats":{"server_start_iso8601":"2016-01-01T00:00:00+0000"}}"#)]
    #[case::null_source(r#"{"icestats":{"server_start_iso8601":"2016-01-01T00:00:00+0000","source":null}}"#)]
    #[case::empty_list(r#"{"icestats":{"server_start_iso8601":"2016-01-01T00:00:00+0000","source":[]}}"#)]
    fn no_mounts_is_an_empty_list(#[case] doc: &str) {
        let (status, shape) = parse_with_shape(doc.as_bytes()).unwrap();
        assert_eq!(shape, SourceShape::List);
        assert!(status.sources.is_empty());
    }

    #[rstest]
    #[case::empty_icestats(r#"{"icestats": {}}"#)]
    #[case::no_icestats(r#"{}"#)]
    #[case::bad_server_start(r#"{"icestats":{"server_start_iso8601":"yesterday","source":[]}}"#)]
    #[case::bad_stream_start(r#"{"icestats":{"server_start_iso8601":"2016-01-01T00:00:00+0000","source":{"listeners":1,"listenurl":"/s","server_type":"audio/mpeg","stream_start_iso8601":"2016-01-01"}}}"#)]
    #[case::negative_listeners(r#"{"icestats":{"server_start_iso8601":"2016-01-01T00:00:00+0000","source":{"listeners":-1,"listenurl":"/s","server_type":"audio/mpeg","stream_start_iso8601":"2016-01-01T01:00:00+0000"}}}"#)]
    #[case::source_is_string(r#"{"icestats":{"server_start_iso8601":"2016-01-01T00:00:00+0000","source":"/stream"}}"#)]
    fn rejects_documents_matching_neither_shape(#[case] doc: &str) {
        let err = parse(doc.as_bytes()).unwrap_err();
        assert!(!err.is_invalid_json());
        assert!(err.to_string().contains("neither source shape"));
    }

    #[rstest]
    #[case::empty(b"".as_slice())]
    #[case::html(b"<html><body>Not Found</body></html>".as_slice())]
    #[case::truncated(b"{\"icestats\":{\"server_start_iso8601\":".as_slice())]
    fn rejects_non_json(#[case] body: &[u8]) {
        let err = parse(body).unwrap_err();
        assert!(err.is_invalid_json());
    }
}
