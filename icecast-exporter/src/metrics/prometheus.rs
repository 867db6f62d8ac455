//! Prometheus text format encoder.
//!
//! Writes metric families in the text exposition format, version 0.0.4.

use std::fmt::Write;

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// Static description of one metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    /// Name without namespace prefix.
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    /// Label names, empty for scalar metrics.
    pub labels: &'static [&'static str],
}

/// Prometheus text encoder.
#[derive(Debug, Clone)]
pub struct PrometheusEncoder {
    namespace: String,
}

impl PrometheusEncoder {
    /// Create an encoder prefixing every metric with `namespace_`.
    ///
    /// An empty namespace leaves names unprefixed.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fully qualified metric name.
    pub fn full_name(&self, desc: &MetricDesc) -> String {
        if self.namespace.is_empty() {
            desc.name.to_string()
        } else {
            format!("{}_{}", self.namespace, desc.name)
        }
    }

    /// Write an unlabeled metric.
    pub fn write_scalar(&self, output: &mut String, desc: &MetricDesc, value: f64) {
        let full_name = self.full_name(desc);
        self.write_header(output, &full_name, desc);
        let _ = writeln!(output, "{} {}", full_name, format_value(value));
    }

    /// Write a labeled metric family.
    ///
    /// Each series supplies one value per label name in `desc.labels`, in
    /// order. Families without series are skipped entirely.
    pub fn write_vector<'a, I, L>(&self, output: &mut String, desc: &MetricDesc, series: I)
    where
        I: IntoIterator<Item = (L, f64)>,
        L: IntoIterator<Item = &'a str>,
    {
        let full_name = self.full_name(desc);
        let mut wrote_header = false;

        for (label_values, value) in series {
            if !wrote_header {
                self.write_header(output, &full_name, desc);
                wrote_header = true;
            }

            let labels_str = desc
                .labels
                .iter()
                .zip(label_values)
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
                .collect::<Vec<_>>()
                .join(",");

            let _ = writeln!(output, "{}{{{}}} {}", full_name, labels_str, format_value(value));
        }
    }

    fn write_header(&self, output: &mut String, full_name: &str, desc: &MetricDesc) {
        let _ = writeln!(output, "# HELP {} {}", full_name, escape_help(desc.help));
        let _ = writeln!(output, "# TYPE {} {}", full_name, desc.kind.as_str());
    }
}

/// Format a sample value the way Prometheus parses it back.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}
