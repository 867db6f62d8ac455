//! Command line and environment configuration.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::api::server::ApiServerConfig;
use crate::logging::LogFormat;
use crate::{Error, Result};

pub const DEFAULT_LISTEN_ADDRESS: &str = ":9146";
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";
pub const DEFAULT_SCRAPE_URI: &str = "http://localhost:8000/status-json.xsl";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "icecast-exporter")]
#[command(version)]
#[command(about = "Prometheus exporter for Icecast streaming servers")]
#[command(long_about = None)]
pub struct Args {
    /// Address to listen on for web interface and telemetry.
    #[arg(
        long = "web.listen-address",
        env = "ICECAST_EXPORTER_LISTEN_ADDRESS",
        value_name = "ADDR",
        default_value = DEFAULT_LISTEN_ADDRESS
    )]
    pub listen_address: String,

    /// Path under which to expose metrics.
    #[arg(
        long = "web.telemetry-path",
        env = "ICECAST_EXPORTER_TELEMETRY_PATH",
        value_name = "PATH",
        default_value = DEFAULT_TELEMETRY_PATH
    )]
    pub telemetry_path: String,

    /// URI on which to scrape Icecast.
    #[arg(
        long = "icecast.scrape-uri",
        env = "ICECAST_EXPORTER_SCRAPE_URI",
        value_name = "URI",
        default_value = DEFAULT_SCRAPE_URI
    )]
    pub scrape_uri: String,

    /// Timeout for trying to get stats from Icecast (e.g. "5s", "1500ms").
    #[arg(
        long = "icecast.timeout",
        env = "ICECAST_EXPORTER_TIMEOUT",
        value_name = "DURATION",
        default_value = "5s",
        value_parser = humantime::parse_duration
    )]
    pub timeout: Duration,

    /// Log level (trace, debug, info, warn, error).
    #[arg(
        long = "log.level",
        env = "ICECAST_EXPORTER_LOG_LEVEL",
        value_name = "LEVEL",
        default_value = "info"
    )]
    pub log_level: String,

    /// Log line format.
    #[arg(
        long = "log.format",
        env = "ICECAST_EXPORTER_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

/// Validated exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub server: ApiServerConfig,
    pub scrape_uri: String,
    pub timeout: Duration,
}

impl Args {
    /// Validate the raw arguments into an [`ExporterConfig`].
    pub fn into_config(self) -> Result<ExporterConfig> {
        let listen_address = parse_listen_address(&self.listen_address)?;
        validate_telemetry_path(&self.telemetry_path)?;
        validate_scrape_uri(&self.scrape_uri)?;

        if self.timeout.is_zero() {
            return Err(Error::config("icecast.timeout must be greater than zero"));
        }

        Ok(ExporterConfig {
            server: ApiServerConfig {
                listen_address,
                telemetry_path: self.telemetry_path,
            },
            scrape_uri: self.scrape_uri,
            timeout: self.timeout,
        })
    }
}

/// Parse a listen address.
///
/// Accepts `host:port`, `[v6]:port`, and `:port` meaning all interfaces.
pub fn parse_listen_address(address: &str) -> Result<SocketAddr> {
    let address = address.trim();
    let candidate = if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    };

    if let Ok(addr) = candidate.parse::<SocketAddr>() {
        return Ok(addr);
    }

    candidate
        .to_socket_addrs()
        .map_err(|e| Error::config(format!("invalid listen address {address:?}: {e}")))?
        .next()
        .ok_or_else(|| Error::config(format!("listen address {address:?} resolved to nothing")))
}

/// The telemetry path must be an absolute, literal route other than `/`.
pub fn validate_telemetry_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::config(format!(
            "telemetry path {path:?} must start with '/'"
        )));
    }
    if path == "/" {
        return Err(Error::config("telemetry path must not be '/'"));
    }
    if path.contains(['{', '}', '*', ':']) {
        return Err(Error::config(format!(
            "telemetry path {path:?} must not contain route parameters"
        )));
    }
    Ok(())
}

/// The scrape URI must be an absolute http(s) URL.
pub fn validate_scrape_uri(uri: &str) -> Result<()> {
    let url =
        Url::parse(uri).map_err(|e| Error::config(format!("invalid scrape URI {uri:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::config(format!(
            "scrape URI {uri:?} has unsupported scheme {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Args {
        let argv = std::iter::once("icecast-exporter").chain(args.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).into_config().unwrap();

        assert_eq!(config.server.listen_address, "0.0.0.0:9146".parse().unwrap());
        assert_eq!(config.server.telemetry_path, "/metrics");
        assert_eq!(config.scrape_uri, DEFAULT_SCRAPE_URI);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.server, ApiServerConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "--web.listen-address",
            "127.0.0.1:9999",
            "--web.telemetry-path",
            "/icecast/metrics",
            "--icecast.scrape-uri",
            "https://radio.example.com/status-json.xsl",
            "--icecast.timeout",
            "1500ms",
            "--log.format",
            "json",
        ]);
        assert_eq!(args.log_format, LogFormat::Json);

        let config = args.into_config().unwrap();
        assert_eq!(config.server.listen_address, "127.0.0.1:9999".parse().unwrap());
        assert_eq!(config.server.telemetry_path, "/icecast/metrics");
        assert_eq!(config.scrape_uri, "https://radio.example.com/status-json.xsl");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_bad_timeout_is_rejected_by_parser() {
        let argv = ["icecast-exporter", "--icecast.timeout", "soon"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = parse(&["--icecast.timeout", "0s"]).into_config().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[rstest]
    #[case(":9146", "0.0.0.0:9146")]
    #[case("127.0.0.1:8080", "127.0.0.1:8080")]
    #[case("[::1]:9146", "[::1]:9146")]
    fn test_listen_address(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            parse_listen_address(input).unwrap(),
            expected.parse::<SocketAddr>().unwrap()
        );
    }

    #[rstest]
    #[case("9146")]
    #[case("127.0.0.1")]
    #[case(":notaport")]
    fn test_invalid_listen_address(#[case] input: &str) {
        assert!(parse_listen_address(input).is_err());
    }

    #[rstest]
    #[case("metrics", false)]
    #[case("/", false)]
    #[case("/{name}", false)]
    #[case("/*rest", false)]
    #[case("/metrics", true)]
    #[case("/probe/metrics", true)]
    fn test_telemetry_path(#[case] path: &str, #[case] valid: bool) {
        assert_eq!(validate_telemetry_path(path).is_ok(), valid);
    }

    #[rstest]
    #[case("http://localhost:8000/status-json.xsl", true)]
    #[case("https://radio.example.com/status-json.xsl", true)]
    #[case("ftp://radio.example.com/status-json.xsl", false)]
    #[case("localhost:8000/status-json.xsl", false)]
    #[case("not a uri", false)]
    fn test_scrape_uri(#[case] uri: &str, #[case] valid: bool) {
        assert_eq!(validate_scrape_uri(uri).is_ok(), valid);
    }
}
