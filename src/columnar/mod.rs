//! Columnar boundary
//!
//! Lays rows out as an Arrow `RecordBatch` following a [`RowSchema`], and reads
//! batch rows back through the [`Row`] contract with [`RowBatch`].

mod batch_row;

pub use batch_row::{BatchRow, RowBatch};

use crate::row::Row;
use crate::schema::RowSchema;
use crate::Result;

use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::{ArrayRef, Float64Array, RecordBatch, TimestampMillisecondArray};
use std::sync::Arc;
use tracing::debug;

/// Convert rows to a record batch.
///
/// Every declared dimension becomes a list column (empty list when the row has
/// no values). Every declared metric becomes a float column holding the row's
/// `float_metric` reading, so absent metrics are written as the default.
pub fn rows_to_batch<R: Row>(schema: &RowSchema, rows: &[R]) -> Result<RecordBatch> {
    let mut columns: Vec<ArrayRef> =
        Vec::with_capacity(1 + schema.dimensions().len() + schema.metrics().len());

    let timestamps: Vec<i64> = rows.iter().map(|r| r.timestamp_from_epoch()).collect();
    columns.push(Arc::new(
        TimestampMillisecondArray::from(timestamps).with_timezone("UTC"),
    ));

    for name in schema.dimensions() {
        let mut builder = ListBuilder::new(StringBuilder::new());
        for row in rows {
            for value in row.dimension(name).iter() {
                builder.values().append_value(value);
            }
            builder.append(true);
        }
        columns.push(Arc::new(builder.finish()));
    }

    for name in schema.metrics() {
        let values: Vec<f64> = rows.iter().map(|r| r.float_metric(name)).collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }

    let batch = RecordBatch::try_new(schema.arrow_schema(), columns)?;
    debug!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "Converted rows to record batch"
    );
    Ok(batch)
}
