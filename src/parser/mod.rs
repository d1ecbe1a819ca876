//! Ingestion parser
//!
//! Turns raw JSON records into [`MapBasedRow`]s. All construction-time
//! failures (missing or unparsable timestamp, non-numeric metric, nested
//! dimension values) are reported here; rows that come out are always valid.

mod timestamp;

pub use timestamp::parse_timestamp;

use crate::config::ParseSpec;
use crate::row::MapBasedRow;
use crate::schema::ColumnName;
use crate::{Error, Result};

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::io::BufRead;
use tracing::{debug, warn};

/// Result of parsing a stream of records
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub rows: Vec<MapBasedRow>,
    /// Lines rejected in lenient mode
    pub skipped: usize,
}

/// Parser from raw JSON records to rows
#[derive(Debug, Clone)]
pub struct RowParser {
    spec: ParseSpec,
    metrics: HashSet<ColumnName>,
}

impl RowParser {
    pub fn new(spec: ParseSpec) -> Result<Self> {
        spec.validate()?;
        let metrics = spec.metrics.iter().cloned().collect();
        Ok(Self { spec, metrics })
    }

    pub fn spec(&self) -> &ParseSpec {
        &self.spec
    }

    /// Parse one JSON object into a row
    pub fn parse_value(&self, value: &Value) -> Result<MapBasedRow> {
        let object = value.as_object().ok_or_else(|| Error::Parse {
            line: None,
            reason: format!("expected a JSON object, got {}", json_type(value)),
        })?;
        let fields = fold_keys(object);

        let raw_ts = fields
            .get(&self.spec.timestamp_column)
            .filter(|v| !v.is_null())
            .ok_or_else(|| Error::MissingTimestamp(self.spec.timestamp_column.to_string()))?;
        let timestamp = parse_timestamp(raw_ts, self.spec.timestamp_format)?;

        let mut metrics = Vec::with_capacity(self.spec.metrics.len());
        for name in &self.spec.metrics {
            if let Some(raw) = fields.get(name) {
                if let Some(value) = metric_value(name, raw)? {
                    metrics.push((name.clone(), value));
                }
            }
        }

        let mut dimensions = Vec::new();
        if self.spec.is_schemaless() {
            for (name, raw) in &fields {
                if *name == self.spec.timestamp_column || self.metrics.contains(name) {
                    continue;
                }
                dimensions.push((name.clone(), dimension_values(name, raw)?));
            }
        } else {
            for name in &self.spec.dimensions {
                if let Some(raw) = fields.get(name) {
                    dimensions.push((name.clone(), dimension_values(name, raw)?));
                }
            }
        }

        Ok(MapBasedRow::new(timestamp, dimensions, metrics))
    }

    /// Parse one JSON document
    pub fn parse_str(&self, json: &str) -> Result<MapBasedRow> {
        let value: Value = serde_json::from_str(json)?;
        self.parse_value(&value)
    }

    /// Parse newline-delimited JSON. Blank lines are ignored. Errors carry the
    /// 1-based line number; in lenient mode bad lines are logged and counted.
    pub fn parse_lines<R: BufRead>(&self, reader: R) -> Result<ParseOutcome> {
        let mut outcome = ParseOutcome::default();
        for (idx, chunk) in reader.split(b'\n').enumerate() {
            let line_no = idx + 1;
            let mut bytes = chunk?;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            let parsed = match std::str::from_utf8(&bytes) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.parse_str(line),
                Err(e) => Err(Error::Parse {
                    line: None,
                    reason: format!("line is not valid UTF-8: {}", e),
                }),
            };
            match parsed {
                Ok(row) => outcome.rows.push(row),
                Err(e) if self.spec.skip_invalid => {
                    warn!(line = line_no, error = %e, "Skipping invalid record");
                    outcome.skipped += 1;
                }
                Err(e) => return Err(e.at_line(line_no)),
            }
        }
        debug!(
            rows = outcome.rows.len(),
            skipped = outcome.skipped,
            "Parsed newline-delimited records"
        );
        Ok(outcome)
    }
}

/// Fold every key to its lowercase form. When two keys fold together, the
/// one visited later wins.
fn fold_keys(object: &Map<String, Value>) -> BTreeMap<ColumnName, &Value> {
    let mut fields = BTreeMap::new();
    for (raw, value) in object {
        if fields.insert(ColumnName::new(raw), value).is_some() {
            debug!(raw_name = %raw, "Record field collides after case folding, keeping latest");
        }
    }
    fields
}

fn metric_value(name: &ColumnName, raw: &Value) -> Result<Option<f64>> {
    match raw {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        // Non-finite values have no JSON encoding, so "NaN" and "inf" are refused
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(Error::Parse {
                line: None,
                reason: format!("metric '{}' is not a finite number: '{}'", name, s),
            }),
        },
        other => Err(Error::Parse {
            line: None,
            reason: format!("metric '{}' is not numeric: {}", name, json_type(other)),
        }),
    }
}

fn dimension_values(name: &ColumnName, raw: &Value) -> Result<Vec<String>> {
    match raw {
        Value::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Some(value) = scalar_string(name, item)? {
                    values.push(value);
                }
            }
            Ok(values)
        }
        other => Ok(scalar_string(name, other)?.into_iter().collect()),
    }
}

fn scalar_string(name: &ColumnName, raw: &Value) -> Result<Option<String>> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(Error::Parse {
            line: None,
            reason: format!("dimension '{}' has a nested {} value", name, json_type(other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
