//! Row views over a record batch

use crate::row::{InputRow, Row, DEFAULT_FLOAT_METRIC};
use crate::schema::{ColumnName, TIMESTAMP_FIELD};
use crate::{Error, Result};

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float64Type, Int64Type, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_schema::{DataType, TimeUnit};
use std::borrow::Cow;
use std::collections::HashMap;

/// A record batch indexed by case-folded column name.
///
/// Column names are folded once here, so batches written by producers that
/// kept mixed-case names are still addressable by lowercase [`ColumnName`]s.
#[derive(Debug, Clone)]
pub struct RowBatch {
    batch: RecordBatch,
    timestamp_column: usize,
    timestamp_unit: TimestampUnit,
    columns: HashMap<ColumnName, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimestampUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    /// Plain Int64 column, read as milliseconds
    RawMillis,
}

impl RowBatch {
    /// Index a batch. Fails if the timestamp column is missing or has an
    /// unsupported type, or if two column names fold to the same name.
    pub fn try_new(batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut columns = HashMap::with_capacity(schema.fields().len());
        for (idx, field) in schema.fields().iter().enumerate() {
            if columns.insert(ColumnName::new(field.name()), idx).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "column '{}' collides with another column after case folding",
                    field.name()
                )));
            }
        }

        let timestamp_column = *columns
            .get(&ColumnName::new(TIMESTAMP_FIELD))
            .ok_or_else(|| Error::InvalidSchema("Missing timestamp column".into()))?;

        let timestamp_unit = match schema.field(timestamp_column).data_type() {
            DataType::Timestamp(TimeUnit::Second, _) => TimestampUnit::Second,
            DataType::Timestamp(TimeUnit::Millisecond, _) => TimestampUnit::Millisecond,
            DataType::Timestamp(TimeUnit::Microsecond, _) => TimestampUnit::Microsecond,
            DataType::Timestamp(TimeUnit::Nanosecond, _) => TimestampUnit::Nanosecond,
            DataType::Int64 => TimestampUnit::RawMillis,
            other => {
                return Err(Error::InvalidSchema(format!(
                    "Unsupported timestamp type {:?}",
                    other
                )))
            }
        };

        let timestamps = batch.column(timestamp_column);
        if timestamps.null_count() > 0 {
            return Err(Error::InvalidSchema(
                "Timestamp column contains nulls".into(),
            ));
        }

        Ok(Self {
            batch,
            timestamp_column,
            timestamp_unit,
            columns,
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// View of row `index`, or `None` when out of range.
    pub fn row(&self, index: usize) -> Option<BatchRow<'_>> {
        (index < self.num_rows()).then_some(BatchRow { batch: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = BatchRow<'_>> + '_ {
        (0..self.num_rows()).map(move |index| BatchRow { batch: self, index })
    }

    fn column(&self, name: &ColumnName) -> Option<&ArrayRef> {
        self.columns
            .get(name)
            .filter(|idx| **idx != self.timestamp_column)
            .map(|idx| self.batch.column(*idx))
    }

    fn timestamp_at(&self, index: usize) -> i64 {
        let col = self.batch.column(self.timestamp_column);
        match self.timestamp_unit {
            TimestampUnit::Second => col
                .as_primitive::<TimestampSecondType>()
                .value(index)
                .saturating_mul(1_000),
            TimestampUnit::Millisecond => {
                col.as_primitive::<TimestampMillisecondType>().value(index)
            }
            TimestampUnit::Microsecond => col
                .as_primitive::<TimestampMicrosecondType>()
                .value(index)
                .div_euclid(1_000),
            TimestampUnit::Nanosecond => col
                .as_primitive::<TimestampNanosecondType>()
                .value(index)
                .div_euclid(1_000_000),
            TimestampUnit::RawMillis => col.as_primitive::<Int64Type>().value(index),
        }
    }
}

impl TryFrom<RecordBatch> for RowBatch {
    type Error = Error;

    fn try_from(batch: RecordBatch) -> Result<Self> {
        RowBatch::try_new(batch)
    }
}

/// One row of a [`RowBatch`], read through the [`Row`] contract.
///
/// Dimension columns may be `List<Utf8>` (multi-valued) or `Utf8`
/// (single-valued). Metric columns may be `Float64` or `Int64`. Nulls and
/// columns of any other type read as absent. Null items inside a list are
/// skipped, so such a dimension reads back with fewer values than the list
/// has slots.
#[derive(Debug, Clone, Copy)]
pub struct BatchRow<'a> {
    batch: &'a RowBatch,
    index: usize,
}

impl BatchRow<'_> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Row for BatchRow<'_> {
    fn timestamp_from_epoch(&self) -> i64 {
        self.batch.timestamp_at(self.index)
    }

    fn dimension(&self, name: &ColumnName) -> Cow<'_, [String]> {
        let Some(col) = self.batch.column(name) else {
            return Cow::Borrowed(&[]);
        };
        if col.is_null(self.index) {
            return Cow::Borrowed(&[]);
        }

        if let Some(list) = col.as_list_opt::<i32>() {
            let values = list.value(self.index);
            match values.as_string_opt::<i32>() {
                Some(strings) => Cow::Owned(
                    strings
                        .iter()
                        .flatten()
                        .map(str::to_string)
                        .collect(),
                ),
                None => Cow::Borrowed(&[]),
            }
        } else if let Some(strings) = col.as_string_opt::<i32>() {
            Cow::Owned(vec![strings.value(self.index).to_string()])
        } else {
            Cow::Borrowed(&[])
        }
    }

    fn float_metric(&self, name: &ColumnName) -> f64 {
        let Some(col) = self.batch.column(name) else {
            return DEFAULT_FLOAT_METRIC;
        };
        if col.is_null(self.index) {
            return DEFAULT_FLOAT_METRIC;
        }

        if let Some(values) = col.as_primitive_opt::<Float64Type>() {
            values.value(self.index)
        } else if let Some(values) = col.as_primitive_opt::<Int64Type>() {
            values.value(self.index) as f64
        } else {
            DEFAULT_FLOAT_METRIC
        }
    }
}

impl InputRow for BatchRow<'_> {
    /// Dimension-typed columns with at least one value in this row.
    fn dimension_names(&self) -> Vec<ColumnName> {
        let mut names: Vec<ColumnName> = self
            .batch
            .columns
            .iter()
            .filter(|(_, idx)| **idx != self.batch.timestamp_column)
            .filter(|(_, idx)| {
                matches!(
                    self.batch.batch.column(**idx).data_type(),
                    DataType::List(_) | DataType::Utf8
                )
            })
            .map(|(name, _)| name)
            .filter(|name| !self.dimension(name).is_empty())
            .cloned()
            .collect();
        names.sort();
        names
    }
}
