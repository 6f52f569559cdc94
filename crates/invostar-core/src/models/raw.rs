//! Raw invoice records as delivered by the accounting API.
//!
//! The upstream payload is loosely typed: identifiers arrive as strings or
//! numbers, amounts as numbers or numeric strings, and most sections may be
//! missing. These types give that payload an explicit shape so the builder
//! can reject incomplete records before expanding them into facts.

use std::io::Read;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{InvoiceError, Result, StarError};
use crate::models::dimensions::parse_invoice_date;

/// A single invoice as fetched from the accounting API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInvoice {
    /// Invoice identifier.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    /// Issue date (ISO date or timestamp).
    #[serde(default, deserialize_with = "string_or_number")]
    pub date: String,

    /// Invoice status as reported upstream.
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: String,

    /// Free-text observations, used to classify the customer.
    #[serde(default, deserialize_with = "string_or_number")]
    pub observations: String,

    /// Buyer.
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer: RawCustomer,

    /// Seller; some invoices carry none.
    #[serde(default)]
    pub seller: Option<RawSeller>,

    /// Invoice-level totals.
    #[serde(default, deserialize_with = "null_as_default")]
    pub totals: RawTotals,

    /// Line items.
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<RawItem>,

    /// Payments applied to the invoice.
    #[serde(default, deserialize_with = "null_as_default")]
    pub payments: Vec<RawPayment>,

    /// Why the record could not be read into this shape, if it could not.
    #[serde(skip)]
    pub malformed: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCustomer {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub identification: String,
    #[serde(default, deserialize_with = "name_or_parts")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSeller {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "name_or_parts")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTotals {
    #[serde(default)]
    pub subtotal: RawAmount,
    #[serde(default)]
    pub discount: RawAmount,
    #[serde(default)]
    pub taxes: RawAmount,
    #[serde(default)]
    pub total: RawAmount,
}

/// A line item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    /// Product code, the natural key of the product dimension.
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub description: String,
    #[serde(default)]
    pub quantity: RawAmount,
    #[serde(default)]
    pub price: RawAmount,
    #[serde(default)]
    pub discount: RawAmount,
    #[serde(default)]
    pub total: RawAmount,
}

/// A payment applied to an invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPayment {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(default)]
    pub value: RawAmount,
}

/// An amount kept in its textual form until the invoice is expanded.
///
/// Parsing is deferred so that one bad amount fails only its own invoice
/// instead of the whole input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawAmount(String);

impl RawAmount {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a decimal; an absent amount is zero.
    pub fn to_decimal(
        &self,
        invoice: &str,
        field: &str,
    ) -> std::result::Result<Decimal, InvoiceError> {
        let text = self.0.trim();
        if text.is_empty() {
            return Ok(Decimal::ZERO);
        }

        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| InvoiceError::InvalidAmount {
                invoice: invoice.to_string(),
                field: field.to_string(),
                value: text.to_string(),
            })
    }
}

impl From<Decimal> for RawAmount {
    fn from(value: Decimal) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => RawAmount::default(),
            Value::Number(n) => RawAmount(n.to_string()),
            Value::String(s) => RawAmount(s),
            other => RawAmount(other.to_string()),
        })
    }
}

impl RawInvoice {
    /// Convert one upstream record. A record that does not fit the schema
    /// is kept, flagged as malformed, so it fails on its own during
    /// processing instead of failing the whole file.
    pub fn from_value(value: Value) -> Self {
        let id = value.get("id").map(value_to_string).unwrap_or_default();

        serde_json::from_value(value).unwrap_or_else(|e| RawInvoice {
            id,
            malformed: Some(e.to_string()),
            ..Default::default()
        })
    }

    /// Reject records that cannot produce well-formed facts and return the
    /// parsed issue date.
    pub fn check(&self) -> std::result::Result<NaiveDate, InvoiceError> {
        if let Some(reason) = &self.malformed {
            return Err(InvoiceError::Malformed {
                invoice: if self.id.trim().is_empty() {
                    "<unknown>".to_string()
                } else {
                    self.id.clone()
                },
                reason: reason.clone(),
            });
        }

        if self.id.trim().is_empty() {
            return Err(InvoiceError::MissingField {
                invoice: "<unknown>".to_string(),
                field: "id",
            });
        }

        if self.customer.id.trim().is_empty() {
            return Err(InvoiceError::MissingField {
                invoice: self.id.clone(),
                field: "customer.id",
            });
        }

        if self.date.trim().is_empty() {
            return Err(InvoiceError::MissingField {
                invoice: self.id.clone(),
                field: "date",
            });
        }

        parse_invoice_date(&self.date).ok_or_else(|| InvoiceError::InvalidDate {
            invoice: self.id.clone(),
            value: self.date.clone(),
        })
    }
}

/// Load invoices from JSON.
///
/// Accepts a bare array of invoices or a page object with a `results` array.
/// Only the envelope has to be well formed; each record is converted on its
/// own (see [`RawInvoice::from_value`]).
pub fn load_invoices<R: Read>(reader: R) -> Result<Vec<RawInvoice>> {
    let payload: Value = serde_json::from_reader(reader)?;

    let records = match payload {
        Value::Array(records) => records,
        Value::Object(mut page) => match page.remove("results") {
            Some(Value::Array(records)) => records,
            _ => return Err(envelope_error()),
        },
        _ => return Err(envelope_error()),
    };

    Ok(records.into_iter().map(RawInvoice::from_value).collect())
}

fn envelope_error() -> StarError {
    StarError::Json(<serde_json::Error as serde::de::Error>::custom(
        "expected an array of invoices or an object with a `results` array",
    ))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `null` sections are treated like missing ones.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Names arrive either as a string or as a list of name parts.
fn name_or_parts<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.as_str())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_are_normalised() {
        let json = r#"{
            "id": 12345,
            "date": "2024-09-15",
            "customer": { "id": 7, "name": ["Cliente", "Ejemplo"] },
            "seller": { "id": 3, "name": "Ana" },
            "items": [{ "code": 100, "quantity": 2, "price": "50000.50" }]
        }"#;

        let invoice: RawInvoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.id, "12345");
        assert_eq!(invoice.customer.id, "7");
        assert_eq!(invoice.customer.name, "Cliente Ejemplo");
        assert_eq!(invoice.seller.as_ref().unwrap().id, "3");
        assert_eq!(invoice.items[0].code, "100");
        assert_eq!(
            invoice.items[0].price.to_decimal("12345", "price").unwrap(),
            Decimal::from_str("50000.50").unwrap()
        );
        assert!(invoice.payments.is_empty());
    }

    #[test]
    fn test_absent_amount_is_zero() {
        let amount = RawAmount::default();
        assert_eq!(amount.to_decimal("1", "total").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_bad_amount_is_reported() {
        let amount = RawAmount::new("twelve");
        let err = amount.to_decimal("INV-1", "items[0].price").unwrap_err();
        assert_eq!(
            err,
            InvoiceError::InvalidAmount {
                invoice: "INV-1".to_string(),
                field: "items[0].price".to_string(),
                value: "twelve".to_string(),
            }
        );
    }

    #[test]
    fn test_check_requires_customer_and_date() {
        let mut invoice = RawInvoice {
            id: "A1".to_string(),
            date: "2024-01-10".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            invoice.check(),
            Err(InvoiceError::MissingField { field: "customer.id", .. })
        ));

        invoice.customer.id = "C1".to_string();
        assert_eq!(invoice.check(), Ok(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));

        invoice.date = "yesterday".to_string();
        assert!(matches!(invoice.check(), Err(InvoiceError::InvalidDate { .. })));
    }

    #[test]
    fn test_load_page_and_list() {
        let page = r#"{ "results": [{ "id": "1" }, { "id": "2" }] }"#;
        assert_eq!(load_invoices(page.as_bytes()).unwrap().len(), 2);

        let list = r#"[{ "id": "1" }]"#;
        assert_eq!(load_invoices(list.as_bytes()).unwrap().len(), 1);

        assert!(load_invoices(r#"{ "count": 0 }"#.as_bytes()).is_err());
        assert!(load_invoices("42".as_bytes()).is_err());
    }

    #[test]
    fn test_null_sections_are_defaults() {
        let json = r#"{
            "id": "B",
            "date": "2024-09-15",
            "customer": null,
            "seller": null,
            "totals": null,
            "items": null,
            "payments": null
        }"#;

        let invoice: RawInvoice = serde_json::from_str(json).unwrap();
        assert!(invoice.customer.id.is_empty());
        assert!(invoice.seller.is_none());
        assert!(invoice.items.is_empty());
        assert!(invoice.payments.is_empty());
        assert!(invoice.malformed.is_none());
    }

    #[test]
    fn test_mistyped_record_is_flagged_not_fatal() {
        let json = r#"[
            { "id": "A", "date": "2024-09-15", "customer": { "id": 1 } },
            { "id": 7, "date": "2024-09-15", "customer": { "id": 1 }, "items": { "code": "P1" } }
        ]"#;

        let invoices = load_invoices(json.as_bytes()).unwrap();
        assert_eq!(invoices.len(), 2);
        assert!(invoices[0].check().is_ok());

        assert_eq!(invoices[1].id, "7");
        assert!(matches!(
            invoices[1].check(),
            Err(InvoiceError::Malformed { ref invoice, .. }) if invoice == "7"
        ));
    }
}
