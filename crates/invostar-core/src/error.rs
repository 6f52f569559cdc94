//! Error types for the invostar-core library.

use thiserror::Error;

/// Main error type for the invostar library.
#[derive(Error, Debug)]
pub enum StarError {
    /// The batch is larger than the license allows.
    #[error(
        "license limit exceeded: {tier} license allows at most {max} invoices per export, requested {requested}"
    )]
    LicenseLimitExceeded {
        tier: String,
        max: usize,
        requested: usize,
    },

    /// The license does not include star-schema export at all, so any
    /// non-empty request is over its effective limit of zero.
    #[error(
        "star-schema export is not available with the {tier} license: limit 0 invoices per export, requested {requested}"
    )]
    FeatureUnavailable { tier: String, requested: usize },

    /// `export()` or `validate()` called before any batch was processed.
    #[error("no batch has been processed yet")]
    NotProcessed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors for a single malformed or incomplete raw invoice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    /// Required field is missing or empty.
    #[error("invoice {invoice}: missing required field {field}")]
    MissingField { invoice: String, field: &'static str },

    /// The invoice date cannot be parsed.
    #[error("invoice {invoice}: invalid date '{value}'")]
    InvalidDate { invoice: String, value: String },

    /// The record does not fit the invoice schema at all.
    #[error("invoice {invoice}: malformed record: {reason}")]
    Malformed { invoice: String, reason: String },

    /// A monetary or quantity field is not a number.
    #[error("invoice {invoice}: invalid amount for {field}: '{value}'")]
    InvalidAmount {
        invoice: String,
        field: String,
        value: String,
    },
}

/// Result type for the invostar library.
pub type Result<T> = std::result::Result<T, StarError>;
