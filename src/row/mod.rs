//! The row contract
//!
//! A row is an immutable view over one event: a timestamp, dimension values and
//! metric values. Producers (parsers, columnar readers, decoders) build rows;
//! downstream stages only read them through [`Row`].
//!
//! Names passed to the accessors are [`ColumnName`]s, which are lowercased at
//! construction. A lookup can therefore never be made with a mixed-case key.

mod map_based;

pub use map_based::{MapBasedRow, MapBasedRowBuilder};

use crate::schema::ColumnName;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// Value returned by [`Row::float_metric`] when the row carries no value for
/// the metric, whether or not the metric is declared anywhere.
pub const DEFAULT_FLOAT_METRIC: f64 = 0.0;

/// Field carrying the variant tag in serialized rows
pub const VERSION_FIELD: &str = "version";

/// Variant tag of [`MapBasedRow`]
pub const MAP_BASED_VERSION: &str = "v1";

/// Read-only view over one event.
///
/// Accessors are total: a missing dimension reads as an empty slice and a
/// missing metric reads as [`DEFAULT_FLOAT_METRIC`].
pub trait Row {
    /// Event time in milliseconds since the Unix epoch (UTC).
    fn timestamp_from_epoch(&self) -> i64;

    /// Values of a dimension, in the order they were produced.
    fn dimension(&self, name: &ColumnName) -> Cow<'_, [String]>;

    /// Value of a metric, or [`DEFAULT_FLOAT_METRIC`] if absent.
    fn float_metric(&self, name: &ColumnName) -> f64;

    /// Event time as a UTC datetime. `None` only if the millisecond value is
    /// outside chrono's representable range.
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_from_epoch())
    }
}

/// A row produced at ingestion, which also knows which dimensions it carries.
pub trait InputRow: Row {
    /// Dimension names present in this row, sorted.
    fn dimension_names(&self) -> Vec<ColumnName>;
}

impl<R: Row + ?Sized> Row for &R {
    fn timestamp_from_epoch(&self) -> i64 {
        (**self).timestamp_from_epoch()
    }

    fn dimension(&self, name: &ColumnName) -> Cow<'_, [String]> {
        (**self).dimension(name)
    }

    fn float_metric(&self, name: &ColumnName) -> f64 {
        (**self).float_metric(name)
    }
}

impl<R: Row + ?Sized> Row for Arc<R> {
    fn timestamp_from_epoch(&self) -> i64 {
        (**self).timestamp_from_epoch()
    }

    fn dimension(&self, name: &ColumnName) -> Cow<'_, [String]> {
        (**self).dimension(name)
    }

    fn float_metric(&self, name: &ColumnName) -> f64 {
        (**self).float_metric(name)
    }
}

/// Closed set of row representations that can cross a serialization boundary.
///
/// The variant is carried in the `"version"` field so decoders can rebuild the
/// right representation. New representations are added as new variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum AnyRow {
    /// Map-backed row
    #[serde(rename = "v1")]
    V1(MapBasedRow),
}

impl AnyRow {
    /// Tags of every registered variant
    pub const VERSIONS: &'static [&'static str] = &[MAP_BASED_VERSION];

    pub fn version(&self) -> &'static str {
        match self {
            AnyRow::V1(_) => MAP_BASED_VERSION,
        }
    }

    /// Decode a tagged row, reporting unregistered tags as
    /// [`Error::UnknownVersion`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        match value.get(VERSION_FIELD) {
            Some(serde_json::Value::String(tag)) if !Self::VERSIONS.contains(&tag.as_str()) => {
                return Err(Error::UnknownVersion(tag.clone()));
            }
            Some(serde_json::Value::String(_)) => {}
            Some(other) => return Err(Error::UnknownVersion(other.to_string())),
            None => {
                return Err(Error::Serialization(format!(
                    "missing '{}' field",
                    VERSION_FIELD
                )))
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<MapBasedRow> for AnyRow {
    fn from(row: MapBasedRow) -> Self {
        AnyRow::V1(row)
    }
}

impl Row for AnyRow {
    fn timestamp_from_epoch(&self) -> i64 {
        match self {
            AnyRow::V1(row) => row.timestamp_from_epoch(),
        }
    }

    fn dimension(&self, name: &ColumnName) -> Cow<'_, [String]> {
        match self {
            AnyRow::V1(row) => row.dimension(name),
        }
    }

    fn float_metric(&self, name: &ColumnName) -> f64 {
        match self {
            AnyRow::V1(row) => row.float_metric(name),
        }
    }
}

impl InputRow for AnyRow {
    fn dimension_names(&self) -> Vec<ColumnName> {
        match self {
            AnyRow::V1(row) => row.dimension_names(),
        }
    }
}
