//! Star-schema construction, export and validation.

mod builder;
pub mod table;
mod validate;

pub use builder::{
    BuilderOptions, DimensionCounts, ExportStatistics, InvoiceFailure, ProcessingStats,
    StarSchemaBuilder, NO_ITEM, NO_PAYMENT, NO_SELLER,
};
pub use table::{Table, TableSet, TableWriter, WriteOutcome, WriteReport, TABLE_NAMES};
pub use validate::ValidationResult;
