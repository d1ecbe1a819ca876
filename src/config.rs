//! Parser configuration
//!
//! A [`ParseSpec`] tells the ingestion parser where the timestamp lives, how to
//! read it, and which fields are dimensions or metrics. It can be loaded from a
//! JSON document or from environment variables.

use crate::schema::{ColumnName, RowSchema};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// How the timestamp field is encoded in raw records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// Epoch millis (number or numeric string) or RFC 3339 string
    #[default]
    Auto,
    /// Epoch milliseconds only
    Millis,
    /// RFC 3339 / ISO-8601 strings only
    Iso,
}

impl TimestampFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Millis => "millis",
            Self::Iso => "iso",
        }
    }
}

impl std::str::FromStr for TimestampFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "millis" | "ms" | "epoch_millis" => Ok(Self::Millis),
            "iso" | "rfc3339" | "iso8601" => Ok(Self::Iso),
            other => Err(format!(
                "unknown timestamp format '{}'; expected one of auto, millis, iso",
                other
            )),
        }
    }
}

/// Configuration for [`RowParser`](crate::parser::RowParser)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseSpec {
    /// Field holding the event time, matched case-insensitively
    pub timestamp_column: ColumnName,
    pub timestamp_format: TimestampFormat,
    /// Dimensions to extract. Empty means every field that is neither the
    /// timestamp nor a metric.
    pub dimensions: Vec<ColumnName>,
    pub metrics: Vec<ColumnName>,
    /// Log and skip bad input lines instead of failing
    pub skip_invalid: bool,
}

impl Default for ParseSpec {
    fn default() -> Self {
        Self {
            timestamp_column: ColumnName::new("timestamp"),
            timestamp_format: TimestampFormat::Auto,
            dimensions: Vec::new(),
            metrics: Vec::new(),
            skip_invalid: false,
        }
    }
}

impl ParseSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: ParseSpec =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Build a spec from environment variables
    ///
    /// Environment variables:
    /// - EVENTROW_TIMESTAMP_COLUMN: timestamp field (default: timestamp)
    /// - EVENTROW_TIMESTAMP_FORMAT: auto (default), millis or iso
    /// - EVENTROW_DIMENSIONS: comma-separated dimension names (default: all)
    /// - EVENTROW_METRICS: comma-separated metric names
    /// - EVENTROW_SKIP_INVALID: "1"/"true" to skip bad lines
    pub fn from_env() -> Result<Self> {
        let spec = Self::from_lookup(|key| std::env::var(key).ok())?;
        info!(
            timestamp_column = %spec.timestamp_column,
            timestamp_format = spec.timestamp_format.as_str(),
            dimensions = spec.dimensions.len(),
            metrics = spec.metrics.len(),
            "Loaded parse spec from environment"
        );
        Ok(spec)
    }

    /// Build a spec from `EVENTROW_*` variables resolved through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut spec = ParseSpec::default();

        if let Some(column) = lookup("EVENTROW_TIMESTAMP_COLUMN") {
            let column = column.trim();
            if column.is_empty() {
                return Err(Error::Config(
                    "EVENTROW_TIMESTAMP_COLUMN cannot be empty".to_string(),
                ));
            }
            spec.timestamp_column = ColumnName::new(column);
        }

        if let Some(format) = lookup("EVENTROW_TIMESTAMP_FORMAT") {
            spec.timestamp_format = format
                .parse()
                .map_err(|e| Error::Config(format!("invalid EVENTROW_TIMESTAMP_FORMAT: {e}")))?;
        }

        if let Some(dimensions) = lookup("EVENTROW_DIMENSIONS") {
            spec.dimensions = parse_name_list(&dimensions);
        }
        if let Some(metrics) = lookup("EVENTROW_METRICS") {
            spec.metrics = parse_name_list(&metrics);
        }

        spec.skip_invalid = lookup("EVENTROW_SKIP_INVALID")
            .map(|value| {
                let value = value.trim();
                value == "1" || value.eq_ignore_ascii_case("true")
            })
            .unwrap_or(false);

        spec.validate()?;
        Ok(spec)
    }

    /// Reject overlapping or duplicated names
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&ColumnName> = HashSet::new();
        seen.insert(&self.timestamp_column);
        for name in self.dimensions.iter().chain(self.metrics.iter()) {
            if !seen.insert(name) {
                return Err(Error::Config(format!(
                    "column '{}' is listed more than once (names are case-insensitive)",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Whether dimensions are discovered from each record
    pub fn is_schemaless(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Columnar schema for the declared columns. Only meaningful when the
    /// dimensions are listed explicitly.
    pub fn row_schema(&self) -> Result<RowSchema> {
        let builder = self
            .dimensions
            .iter()
            .cloned()
            .fold(RowSchema::builder(), |b, name| b.with_dimension(name));
        self.metrics
            .iter()
            .cloned()
            .fold(builder, |b, name| b.with_metric(name))
            .build()
    }
}

fn parse_name_list(raw: &str) -> Vec<ColumnName> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ColumnName::new)
        .collect()
}
