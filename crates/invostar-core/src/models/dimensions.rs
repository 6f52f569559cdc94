//! Dimension records of the star schema.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One output row, keyed by column header.
pub type Row = BTreeMap<String, String>;

/// A record that can be projected into a table row.
pub trait TableRow {
    /// Column headers, in output order.
    fn headers() -> &'static [&'static str];

    /// Natural key of the record.
    fn key(&self) -> &str;

    /// Project the record into a row.
    fn to_row(&self, format: &NumberFormat) -> Row;
}

/// How decimal values are rendered in output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    /// Use `,` as the decimal separator (`1234,50`).
    pub decimal_comma: bool,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self { decimal_comma: true }
    }
}

impl NumberFormat {
    /// Currency: always two decimals.
    pub fn currency(&self, value: Decimal) -> String {
        self.separator(format!("{:.2}", value.round_dp(2)))
    }

    /// Quantity: integer when whole, otherwise two decimals.
    pub fn quantity(&self, value: Decimal) -> String {
        if value.fract().is_zero() {
            value.trunc().normalize().to_string()
        } else {
            self.currency(value)
        }
    }

    fn separator(&self, text: String) -> String {
        if self.decimal_comma {
            text.replace('.', ",")
        } else {
            text
        }
    }
}

fn row<const N: usize>(cells: [(&str, String); N]) -> Row {
    cells
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Client dimension, keyed by customer id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimClient {
    pub client_id: String,
    pub identification: String,
    pub name: String,
    pub email: String,
    /// Derived from the invoice observations.
    pub client_type: String,
    /// Derived from the invoice observations.
    pub tax_regime: String,
}

impl TableRow for DimClient {
    fn headers() -> &'static [&'static str] {
        &[
            "client_id",
            "identification",
            "name",
            "email",
            "client_type",
            "tax_regime",
        ]
    }

    fn key(&self) -> &str {
        &self.client_id
    }

    fn to_row(&self, _format: &NumberFormat) -> Row {
        row([
            ("client_id", self.client_id.clone()),
            ("identification", self.identification.clone()),
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("client_type", self.client_type.clone()),
            ("tax_regime", self.tax_regime.clone()),
        ])
    }
}

/// Seller dimension, keyed by seller id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimSeller {
    pub seller_id: String,
    pub name: String,
    pub zone: String,
}

impl TableRow for DimSeller {
    fn headers() -> &'static [&'static str] {
        &["seller_id", "name", "zone"]
    }

    fn key(&self) -> &str {
        &self.seller_id
    }

    fn to_row(&self, _format: &NumberFormat) -> Row {
        row([
            ("seller_id", self.seller_id.clone()),
            ("name", self.name.clone()),
            ("zone", self.zone.clone()),
        ])
    }
}

/// Product dimension, keyed by product code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimProduct {
    pub product_code: String,
    pub description: String,
    pub category: String,
    /// Unit price at first sighting.
    pub standard_price: Decimal,
}

impl TableRow for DimProduct {
    fn headers() -> &'static [&'static str] {
        &["product_code", "description", "category", "standard_price"]
    }

    fn key(&self) -> &str {
        &self.product_code
    }

    fn to_row(&self, format: &NumberFormat) -> Row {
        row([
            ("product_code", self.product_code.clone()),
            ("description", self.description.clone()),
            ("category", self.category.clone()),
            ("standard_price", format.currency(self.standard_price)),
        ])
    }
}

/// Payment method dimension, keyed by payment id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimPayment {
    pub payment_id: String,
    pub name: String,
    pub category: String,
}

impl TableRow for DimPayment {
    fn headers() -> &'static [&'static str] {
        &["payment_id", "name", "category"]
    }

    fn key(&self) -> &str {
        &self.payment_id
    }

    fn to_row(&self, _format: &NumberFormat) -> Row {
        row([
            ("payment_id", self.payment_id.clone()),
            ("name", self.name.clone()),
            ("category", self.category.clone()),
        ])
    }
}

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

const DAY_NAMES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// Date dimension, keyed by ISO date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimDate {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub quarter: u32,
    pub month_name: String,
    pub day_name: String,
}

impl DimDate {
    /// Calendar decomposition of a date.
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            year: date.year(),
            month,
            day: date.day(),
            quarter: (month - 1) / 3 + 1,
            month_name: MONTH_NAMES[(month - 1) as usize].to_string(),
            day_name: DAY_NAMES[date.weekday().num_days_from_monday() as usize].to_string(),
        }
    }
}

impl TableRow for DimDate {
    fn headers() -> &'static [&'static str] {
        &[
            "date",
            "year",
            "month",
            "day",
            "quarter",
            "month_name",
            "day_name",
        ]
    }

    fn key(&self) -> &str {
        &self.date
    }

    fn to_row(&self, _format: &NumberFormat) -> Row {
        row([
            ("date", self.date.clone()),
            ("year", self.year.to_string()),
            ("month", self.month.to_string()),
            ("day", self.day.to_string()),
            ("quarter", self.quarter.to_string()),
            ("month_name", self.month_name.clone()),
            ("day_name", self.day_name.clone()),
        ])
    }
}

/// Parse an invoice date: plain ISO date, RFC 3339 timestamp, or a naive
/// `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn parse_invoice_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_date_decomposition() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 15).unwrap();
        let dim = DimDate::from_date(date);

        assert_eq!(dim.date, "2024-09-15");
        assert_eq!(dim.quarter, 3);
        assert_eq!(dim.month_name, "Septiembre");
        assert_eq!(dim.day_name, "Domingo");
    }

    #[test]
    fn test_parse_invoice_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31);

        assert_eq!(parse_invoice_date("2024-01-31"), expected);
        assert_eq!(parse_invoice_date("2024-01-31T10:00:00Z"), expected);
        assert_eq!(parse_invoice_date("2024-01-31T23:30:00-05:00"), expected);
        assert_eq!(parse_invoice_date("2024-01-31T08:15:00"), expected);
        assert_eq!(parse_invoice_date("31/01/2024"), None);
        assert_eq!(parse_invoice_date(""), None);
    }

    #[test]
    fn test_number_format() {
        let comma = NumberFormat::default();
        let dot = NumberFormat { decimal_comma: false };
        let price = Decimal::from_str("1234.5").unwrap();

        assert_eq!(comma.currency(price), "1234,50");
        assert_eq!(dot.currency(price), "1234.50");
        assert_eq!(comma.quantity(Decimal::from_str("2.00").unwrap()), "2");
        assert_eq!(comma.quantity(Decimal::from_str("1.5").unwrap()), "1,50");
        assert_eq!(comma.currency(Decimal::ZERO), "0,00");
    }

    #[test]
    fn test_product_row_uses_headers() {
        let product = DimProduct {
            product_code: "P1".to_string(),
            description: "Servicio de soporte".to_string(),
            category: "Servicios".to_string(),
            standard_price: Decimal::new(990, 1),
        };

        let row = product.to_row(&NumberFormat::default());
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        let mut headers = DimProduct::headers().to_vec();
        headers.sort_unstable();

        assert_eq!(keys, headers);
        assert_eq!(row["standard_price"], "99,00");
    }
}
