//! Structural and referential checks over a built star schema.
//!
//! Empty required tables are errors and make the schema invalid. Foreign
//! keys that resolve to no dimension record are warnings only, since the
//! source may reference records filtered out upstream.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, StarError};
use crate::models::fact::FactInvoice;

use super::builder::StarSchemaBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({} warnings, {} errors)",
            if self.valid { "PASSED" } else { "FAILED" },
            self.warnings.len(),
            self.errors.len()
        )
    }
}

/// Keys referenced by facts but absent from the dimension.
fn orphans<'a, V>(
    facts: &'a [FactInvoice],
    foreign_key: impl Fn(&'a FactInvoice) -> &'a str,
    dimension: &BTreeMap<String, V>,
) -> BTreeSet<&'a str> {
    facts
        .iter()
        .map(foreign_key)
        .filter(|key| !dimension.contains_key(*key))
        .collect()
}

fn orphan_warning(dimension: &str, keys: &BTreeSet<&str>) -> Option<String> {
    if keys.is_empty() {
        return None;
    }
    let listed: Vec<&str> = keys.iter().copied().collect();
    Some(format!(
        "Orphaned {} keys in facts: {}",
        dimension,
        listed.join(", ")
    ))
}

impl StarSchemaBuilder {
    /// Check the current batch for emptiness and dangling foreign keys.
    pub fn validate(&self) -> Result<ValidationResult> {
        if !self.processed {
            return Err(StarError::NotProcessed);
        }

        let mut result = ValidationResult::new();
        let facts = self.facts.as_slice();

        let checks = [
            ("client", orphans(facts, |f| f.client_id.as_str(), &self.clients)),
            ("seller", orphans(facts, |f| f.seller_id.as_str(), &self.sellers)),
            ("product", orphans(facts, |f| f.product_code.as_str(), &self.products)),
            ("payment", orphans(facts, |f| f.payment_id.as_str(), &self.payments)),
            ("date", orphans(facts, |f| f.date.as_str(), &self.dates)),
        ];

        for (dimension, keys) in &checks {
            if let Some(message) = orphan_warning(dimension, keys) {
                warn!("{}", message);
                result.warnings.push(message);
            }
        }

        if self.clients.is_empty() {
            result.error("No clients dimension data");
        }

        if self.facts.is_empty() {
            result.error("No fact data");
        }

        info!("Star schema validation: {}", result.summary());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::raw::{RawCustomer, RawInvoice};
    use rust_decimal::Decimal;

    fn raw(id: &str, customer: &str) -> RawInvoice {
        RawInvoice {
            id: id.to_string(),
            date: "2024-06-30".to_string(),
            customer: RawCustomer {
                id: customer.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn stray_fact(client_id: &str, product_code: &str) -> FactInvoice {
        FactInvoice {
            invoice_id: "X".to_string(),
            date: "2024-06-30".to_string(),
            client_id: client_id.to_string(),
            seller_id: "NO_SELLER".to_string(),
            product_code: product_code.to_string(),
            quantity: Decimal::ZERO,
            price: Decimal::ZERO,
            discount: Decimal::ZERO,
            line_total: Decimal::ZERO,
            payment_id: "NO_PAYMENT".to_string(),
            subtotal: Decimal::ZERO,
            discount_total: Decimal::ZERO,
            taxes: Decimal::ZERO,
            total: Decimal::ZERO,
            status: "Open".to_string(),
            observations: String::new(),
        }
    }

    #[test]
    fn test_clean_batch_is_valid() {
        let mut builder = StarSchemaBuilder::new();
        builder.process(&[raw("1", "C1"), raw("2", "C2")]).unwrap();

        let result = builder.validate().unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_empty_batch_is_invalid() {
        let mut builder = StarSchemaBuilder::new();
        builder.process(&[]).unwrap();

        let result = builder.validate().unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("No fact data")));
        assert!(result.errors.iter().any(|e| e.contains("No clients")));
    }

    #[test]
    fn test_orphans_are_warnings() {
        let mut builder = StarSchemaBuilder::new();
        builder.process(&[raw("1", "C1")]).unwrap();
        builder.facts.push(stray_fact("C9", "P9"));
        builder.facts.push(stray_fact("C8", "P9"));

        let result = builder.validate().unwrap();
        assert!(result.is_valid());
        assert_eq!(
            result.warnings,
            vec![
                "Orphaned client keys in facts: C8, C9".to_string(),
                "Orphaned product keys in facts: P9".to_string(),
            ]
        );
    }

    #[test]
    fn test_facts_without_clients_is_error() {
        let mut builder = StarSchemaBuilder::new();
        builder.process(&[raw("1", "C1")]).unwrap();
        builder.clients.clear();

        let result = builder.validate().unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.errors, vec!["No clients dimension data".to_string()]);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_validate_before_process_fails() {
        let builder = StarSchemaBuilder::new();
        assert!(matches!(builder.validate(), Err(StarError::NotProcessed)));
    }
}
