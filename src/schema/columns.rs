//! Declared row schema for the columnar boundary
//!
//! Rows themselves are schema-agnostic. When rows are laid out as an Arrow
//! batch, the set of dimension and metric columns has to be fixed up front;
//! `RowSchema` is that catalogue.

use super::ColumnName;
use crate::{Error, Result};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Standard field names
pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const LIST_ITEM_FIELD: &str = "item";

/// Field metadata key recording whether a column is a dimension or a metric
pub const COLUMN_KIND_KEY: &str = "eventrow.kind";

/// Kind of a non-timestamp column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Categorical, possibly multi-valued string column
    Dimension,
    /// Floating-point column
    Metric,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Dimension => "dimension",
            ColumnKind::Metric => "metric",
        }
    }

    /// Arrow type used to store this column
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Dimension => DataType::List(Arc::new(dimension_item_field())),
            ColumnKind::Metric => DataType::Float64,
        }
    }

    fn to_field(self, name: &ColumnName) -> Field {
        let mut metadata = HashMap::new();
        metadata.insert(COLUMN_KIND_KEY.to_string(), self.as_str().to_string());
        Field::new(name.as_str(), self.data_type(), self != ColumnKind::Dimension)
            .with_metadata(metadata)
    }
}

/// Item field of the list type backing a dimension column
pub fn dimension_item_field() -> Field {
    Field::new(LIST_ITEM_FIELD, DataType::Utf8, true)
}

/// Arrow type of the timestamp column (milliseconds, UTC)
pub fn timestamp_data_type() -> DataType {
    DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into()))
}

/// Ordered dimension and metric catalogue
#[derive(Debug, Clone)]
pub struct RowSchema {
    schema: SchemaRef,
    dimensions: Vec<ColumnName>,
    metrics: Vec<ColumnName>,
}

impl RowSchema {
    /// Create a new schema builder
    pub fn builder() -> RowSchemaBuilder {
        RowSchemaBuilder::new()
    }

    /// Get the Arrow schema
    pub fn arrow_schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn dimensions(&self) -> &[ColumnName] {
        &self.dimensions
    }

    pub fn metrics(&self) -> &[ColumnName] {
        &self.metrics
    }

    /// Kind of the named column, if declared
    pub fn kind_of(&self, name: &ColumnName) -> Option<ColumnKind> {
        if self.dimensions.contains(name) {
            Some(ColumnKind::Dimension)
        } else if self.metrics.contains(name) {
            Some(ColumnKind::Metric)
        } else {
            None
        }
    }
}

/// Builder for RowSchema
#[derive(Debug, Default)]
pub struct RowSchemaBuilder {
    dimensions: Vec<ColumnName>,
    metrics: Vec<ColumnName>,
}

impl RowSchemaBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dimension column
    pub fn with_dimension(mut self, name: impl Into<ColumnName>) -> Self {
        self.dimensions.push(name.into());
        self
    }

    /// Add a metric column
    pub fn with_metric(mut self, name: impl Into<ColumnName>) -> Self {
        self.metrics.push(name.into());
        self
    }

    /// Build the schema, rejecting duplicate or reserved names
    pub fn build(self) -> Result<RowSchema> {
        let mut seen: HashSet<&ColumnName> = HashSet::new();
        for name in self.dimensions.iter().chain(self.metrics.iter()) {
            if name.as_str() == TIMESTAMP_FIELD {
                return Err(Error::InvalidSchema(format!(
                    "column name '{}' is reserved",
                    TIMESTAMP_FIELD
                )));
            }
            if name.as_str().is_empty() {
                return Err(Error::InvalidSchema("empty column name".to_string()));
            }
            if !seen.insert(name) {
                return Err(Error::InvalidSchema(format!(
                    "column '{}' declared more than once",
                    name
                )));
            }
        }

        let mut fields = Vec::with_capacity(1 + self.dimensions.len() + self.metrics.len());
        fields.push(Field::new(TIMESTAMP_FIELD, timestamp_data_type(), false));
        for name in &self.dimensions {
            fields.push(ColumnKind::Dimension.to_field(name));
        }
        for name in &self.metrics {
            fields.push(ColumnKind::Metric.to_field(name));
        }

        Ok(RowSchema {
            schema: Arc::new(Schema::new(fields)),
            dimensions: self.dimensions,
            metrics: self.metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_layout() {
        let schema = RowSchema::builder()
            .with_dimension("Country")
            .with_dimension("tags")
            .with_metric("Clicks")
            .build()
            .unwrap();
        let arrow_schema = schema.arrow_schema();

        assert_eq!(arrow_schema.fields().len(), 4);
        let ts = arrow_schema.field_with_name(TIMESTAMP_FIELD).unwrap();
        assert_eq!(ts.data_type(), &timestamp_data_type());
        assert!(!ts.is_nullable());

        let country = arrow_schema.field_with_name("country").unwrap();
        assert!(matches!(country.data_type(), DataType::List(_)));
        assert_eq!(
            country.metadata().get(COLUMN_KIND_KEY).map(String::as_str),
            Some("dimension")
        );

        let clicks = arrow_schema.field_with_name("clicks").unwrap();
        assert_eq!(clicks.data_type(), &DataType::Float64);
        assert!(clicks.is_nullable());
    }

    #[test]
    fn test_kind_of() {
        let schema = RowSchema::builder()
            .with_dimension("host")
            .with_metric("latency")
            .build()
            .unwrap();
        assert_eq!(schema.kind_of(&"HOST".into()), Some(ColumnKind::Dimension));
        assert_eq!(schema.kind_of(&"latency".into()), Some(ColumnKind::Metric));
        assert_eq!(schema.kind_of(&"other".into()), None);
    }

    #[test]
    fn test_rejects_case_folded_duplicates() {
        let err = RowSchema::builder()
            .with_dimension("Host")
            .with_metric("host")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_rejects_reserved_name() {
        let err = RowSchema::builder()
            .with_dimension("Timestamp")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }
}
