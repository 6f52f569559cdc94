//! Fact table record: one row per invoice × line item × payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::dimensions::{NumberFormat, Row, TableRow};

/// Default cap on the observations carried into a fact row, in characters.
pub const OBSERVATIONS_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactInvoice {
    pub invoice_id: String,
    /// Foreign key into `dim_dates`.
    pub date: String,
    /// Foreign key into `dim_clients`.
    pub client_id: String,
    /// Foreign key into `dim_sellers`.
    pub seller_id: String,
    /// Foreign key into `dim_products`.
    pub product_code: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub discount: Decimal,
    pub line_total: Decimal,
    /// Foreign key into `dim_payments`.
    pub payment_id: String,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub taxes: Decimal,
    pub total: Decimal,
    pub status: String,
    pub observations: String,
}

impl TableRow for FactInvoice {
    fn headers() -> &'static [&'static str] {
        &[
            "invoice_id",
            "date",
            "client_id",
            "seller_id",
            "product_code",
            "product_quantity",
            "product_price",
            "product_discount",
            "product_total",
            "payment_id",
            "subtotal",
            "discount_total",
            "taxes",
            "total",
            "status",
            "observations",
        ]
    }

    fn key(&self) -> &str {
        &self.invoice_id
    }

    fn to_row(&self, format: &NumberFormat) -> Row {
        [
            ("invoice_id", self.invoice_id.clone()),
            ("date", self.date.clone()),
            ("client_id", self.client_id.clone()),
            ("seller_id", self.seller_id.clone()),
            ("product_code", self.product_code.clone()),
            ("product_quantity", format.quantity(self.quantity)),
            ("product_price", format.currency(self.price)),
            ("product_discount", format.currency(self.discount)),
            ("product_total", format.currency(self.line_total)),
            ("payment_id", self.payment_id.clone()),
            ("subtotal", format.currency(self.subtotal)),
            ("discount_total", format.currency(self.discount_total)),
            ("taxes", format.currency(self.taxes)),
            ("total", format.currency(self.total)),
            ("status", self.status.clone()),
            ("observations", self.observations.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Cut `text` to at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
