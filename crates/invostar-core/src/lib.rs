//! Core library for turning invoice batches into a BI star schema.
//!
//! This crate provides:
//! - An explicit schema for raw invoices fetched from the accounting API
//! - Rule-based classification of free-text fields (client type, tax regime,
//!   payment and product categories)
//! - A batch builder producing one fact table and five dimension tables
//! - Referential-integrity validation of the result
//! - The license gate and table writer contracts used around the builder

pub mod error;
pub mod extract;
pub mod license;
pub mod models;
pub mod schema;

pub use error::{InvoiceError, Result, StarError};
pub use extract::{ClientInfo, FieldExtractor, RuleSet};
pub use license::{LicenseGate, LicenseTier, TierLicense};
pub use models::config::StarConfig;
pub use models::dimensions::{DimClient, DimDate, DimPayment, DimProduct, DimSeller, NumberFormat, TableRow};
pub use models::fact::FactInvoice;
pub use models::raw::{load_invoices, RawInvoice};
pub use schema::{
    ProcessingStats, StarSchemaBuilder, Table, TableSet, TableWriter, ValidationResult, WriteReport,
};
