//! Map-backed row (`"v1"`)

use super::{InputRow, Row, DEFAULT_FLOAT_METRIC};
use crate::schema::ColumnName;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

/// Row backed by ordered maps keyed by lowercased name.
///
/// Dimensions with no values are not stored, so every stored value list is
/// non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MapBasedRowRepr")]
pub struct MapBasedRow {
    timestamp: i64,
    dimensions: BTreeMap<ColumnName, Vec<String>>,
    metrics: BTreeMap<ColumnName, f64>,
}

impl MapBasedRow {
    /// Build a row from already-normalized maps.
    pub fn new(
        timestamp: i64,
        dimensions: impl IntoIterator<Item = (ColumnName, Vec<String>)>,
        metrics: impl IntoIterator<Item = (ColumnName, f64)>,
    ) -> Self {
        Self {
            timestamp,
            dimensions: dimensions
                .into_iter()
                .filter(|(_, values)| !values.is_empty())
                .collect(),
            metrics: metrics.into_iter().collect(),
        }
    }

    /// Start a row whose names are folded as they are added.
    pub fn builder(timestamp: i64) -> MapBasedRowBuilder {
        MapBasedRowBuilder::new(timestamp)
    }

    /// Stored dimensions in name order
    pub fn dimensions(&self) -> impl Iterator<Item = (&ColumnName, &[String])> {
        self.dimensions.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Stored metrics in name order
    pub fn metrics(&self) -> impl Iterator<Item = (&ColumnName, f64)> {
        self.metrics.iter().map(|(k, v)| (k, *v))
    }

    pub fn metric_names(&self) -> Vec<ColumnName> {
        self.metrics.keys().cloned().collect()
    }

    pub fn has_metric(&self, name: &ColumnName) -> bool {
        self.metrics.contains_key(name)
    }
}

impl Row for MapBasedRow {
    fn timestamp_from_epoch(&self) -> i64 {
        self.timestamp
    }

    fn dimension(&self, name: &ColumnName) -> Cow<'_, [String]> {
        match self.dimensions.get(name) {
            Some(values) => Cow::Borrowed(values.as_slice()),
            None => Cow::Borrowed(&[]),
        }
    }

    fn float_metric(&self, name: &ColumnName) -> f64 {
        self.metrics
            .get(name)
            .copied()
            .unwrap_or(DEFAULT_FLOAT_METRIC)
    }
}

impl InputRow for MapBasedRow {
    fn dimension_names(&self) -> Vec<ColumnName> {
        self.dimensions.keys().cloned().collect()
    }
}

/// Builder for MapBasedRow
///
/// When two raw names fold to the same key, the later call replaces the
/// earlier one.
#[derive(Debug)]
pub struct MapBasedRowBuilder {
    timestamp: i64,
    dimensions: BTreeMap<ColumnName, Vec<String>>,
    metrics: BTreeMap<ColumnName, f64>,
}

impl MapBasedRowBuilder {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            dimensions: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Set the values of a dimension
    pub fn dimension<I, V>(mut self, name: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let raw = name.as_ref();
        let key = ColumnName::new(raw);
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let replaced = if values.is_empty() {
            self.dimensions.remove(&key).is_some()
        } else {
            self.dimensions.insert(key, values).is_some()
        };
        if replaced {
            debug!(raw_name = raw, "Dimension name collides after case folding, keeping latest");
        }
        self
    }

    /// Set a metric value
    pub fn metric(mut self, name: impl AsRef<str>, value: f64) -> Self {
        let raw = name.as_ref();
        if self.metrics.insert(ColumnName::new(raw), value).is_some() {
            debug!(raw_name = raw, "Metric name collides after case folding, keeping latest");
        }
        self
    }

    pub fn build(self) -> MapBasedRow {
        MapBasedRow {
            timestamp: self.timestamp,
            dimensions: self.dimensions,
            metrics: self.metrics,
        }
    }
}

/// Wire form accepted when decoding. Single string dimension values are
/// widened to one-element lists.
#[derive(Deserialize)]
struct MapBasedRowRepr {
    timestamp: i64,
    #[serde(default)]
    dimensions: BTreeMap<ColumnName, DimensionValues>,
    #[serde(default)]
    metrics: BTreeMap<ColumnName, f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionValues {
    One(String),
    Many(Vec<String>),
}

impl From<DimensionValues> for Vec<String> {
    fn from(values: DimensionValues) -> Self {
        match values {
            DimensionValues::One(value) => vec![value],
            DimensionValues::Many(values) => values,
        }
    }
}

impl From<MapBasedRowRepr> for MapBasedRow {
    fn from(repr: MapBasedRowRepr) -> Self {
        MapBasedRow::new(
            repr.timestamp,
            repr.dimensions.into_iter().map(|(k, v)| (k, v.into())),
            repr.metrics,
        )
    }
}
