//! Schema element names and the columnar row schema
//!
//! The store is case-insensitive for every schema element. Names are folded to
//! lowercase once, at the boundary, and only the folded form is ever used as a
//! lookup key.

mod columns;
mod name;

pub use columns::{
    dimension_item_field,
    timestamp_data_type,
    ColumnKind,
    RowSchema,
    RowSchemaBuilder,
    COLUMN_KIND_KEY,
    LIST_ITEM_FIELD,
    TIMESTAMP_FIELD,
};
pub use name::ColumnName;
