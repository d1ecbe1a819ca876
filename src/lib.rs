//! # eventrow
//!
//! The row abstraction used at the ingestion and query boundaries of a
//! columnar data store.
//!
//! A row is an immutable view over one event: a millisecond timestamp,
//! dimension (string, possibly multi-valued) values and metric (float) values.
//! The store is case-insensitive for schema element names, so every name used
//! to address a row is a lowercased [`ColumnName`](schema::ColumnName).
//!
//! ## Components
//!
//! - **Row**: the [`Row`](row::Row) contract, the map-backed
//!   [`MapBasedRow`](row::MapBasedRow) and the tagged [`AnyRow`](row::AnyRow)
//!   used when rows are serialized
//! - **Columnar**: rows to Arrow record batches and back
//! - **Parser**: raw JSON records to rows
//! - **Config**: the parser's [`ParseSpec`](config::ParseSpec)

pub mod columnar;
pub mod config;
pub mod parser;
pub mod row;
pub mod schema;

mod error;

pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::columnar::{rows_to_batch, BatchRow, RowBatch};
    pub use crate::config::{ParseSpec, TimestampFormat};
    pub use crate::parser::RowParser;
    pub use crate::row::{AnyRow, InputRow, MapBasedRow, Row, DEFAULT_FLOAT_METRIC};
    pub use crate::schema::{ColumnName, RowSchema};
    pub use crate::{Error, Result};
}
