//! Batch transformation of raw invoices into a star schema.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{InvoiceError, Result, StarError};
use crate::extract::FieldExtractor;
use crate::license::{check_batch, LicenseGate, LicenseSummary};
use crate::models::dimensions::{
    DimClient, DimDate, DimPayment, DimProduct, DimSeller, NumberFormat,
};
use crate::models::fact::{truncate_chars, FactInvoice, OBSERVATIONS_LIMIT};
use crate::models::raw::{RawAmount, RawInvoice};

use super::table::{
    Table, TableSet, DIM_CLIENTS, DIM_DATES, DIM_PAYMENTS, DIM_PRODUCTS, DIM_SELLERS,
    FACT_INVOICES,
};

/// Product code used when an invoice has no line items.
pub const NO_ITEM: &str = "NO_ITEM";

/// Payment id used when an invoice has no payments.
pub const NO_PAYMENT: &str = "NO_PAYMENT";

/// Seller id used when an invoice names no seller.
pub const NO_SELLER: &str = "NO_SELLER";

const UNKNOWN_STATUS: &str = "Unknown";

/// Tunables for a builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderOptions {
    /// Maximum characters of observations kept per fact row.
    pub observations_limit: usize,

    /// Zone assigned to every seller.
    pub seller_zone: String,

    /// Rendering of decimal values in exported rows.
    pub number_format: NumberFormat,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            observations_limit: OBSERVATIONS_LIMIT,
            seller_zone: "Unspecified".to_string(),
            number_format: NumberFormat::default(),
        }
    }
}

/// Distinct records per dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCounts {
    pub clients: usize,
    pub sellers: usize,
    pub products: usize,
    pub payments: usize,
    pub dates: usize,
}

/// An invoice skipped during processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFailure {
    /// Position in the input batch.
    pub index: usize,
    pub invoice_id: String,
    pub reason: String,
}

/// Result of [`StarSchemaBuilder::process`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub processed: usize,
    pub errored: usize,
    pub total_facts: usize,
    pub dimensions: DimensionCounts,
    pub failures: Vec<InvoiceFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<LicenseSummary>,
}

/// Snapshot of the builder's current contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStatistics {
    pub facts: usize,
    pub dimensions: DimensionCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<LicenseSummary>,
}

struct LineItem {
    code: String,
    description: String,
    quantity: Decimal,
    price: Decimal,
    discount: Decimal,
    total: Decimal,
}

struct Payment {
    id: String,
    name: String,
}

/// An invoice whose fields have all been checked and parsed.
struct ResolvedInvoice<'a> {
    raw: &'a RawInvoice,
    date: NaiveDate,
    seller_id: String,
    seller_name: String,
    subtotal: Decimal,
    discount: Decimal,
    taxes: Decimal,
    total: Decimal,
    items: Vec<LineItem>,
    payments: Vec<Payment>,
}

/// Builds one fact table and five dimension tables from a batch of invoices.
///
/// A builder holds the tables of exactly one batch: every call to
/// [`process`](Self::process) starts from empty maps. Dimensions keep the
/// attributes of the first invoice that mentions a natural key.
pub struct StarSchemaBuilder {
    options: BuilderOptions,
    license: Option<Box<dyn LicenseGate>>,
    extractor: FieldExtractor,
    pub(super) clients: BTreeMap<String, DimClient>,
    pub(super) sellers: BTreeMap<String, DimSeller>,
    pub(super) products: BTreeMap<String, DimProduct>,
    pub(super) payments: BTreeMap<String, DimPayment>,
    pub(super) dates: BTreeMap<String, DimDate>,
    pub(super) facts: Vec<FactInvoice>,
    pub(super) processed: bool,
}

impl StarSchemaBuilder {
    /// Create a builder with default options and no license gate.
    pub fn new() -> Self {
        Self {
            options: BuilderOptions::default(),
            license: None,
            extractor: FieldExtractor::new(),
            clients: BTreeMap::new(),
            sellers: BTreeMap::new(),
            products: BTreeMap::new(),
            payments: BTreeMap::new(),
            dates: BTreeMap::new(),
            facts: Vec::new(),
            processed: false,
        }
    }

    /// Check every batch against a license gate.
    pub fn with_license<G: LicenseGate + 'static>(mut self, gate: G) -> Self {
        self.license = Some(Box::new(gate));
        self
    }

    /// Set builder options.
    pub fn with_options(mut self, options: BuilderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Drop all tables.
    pub fn reset(&mut self) {
        self.clients.clear();
        self.sellers.clear();
        self.products.clear();
        self.payments.clear();
        self.dates.clear();
        self.facts.clear();
        self.processed = false;
    }

    /// Transform a batch of invoices.
    ///
    /// Fails only when the license gate rejects the batch, in which case
    /// nothing is touched. Malformed invoices are skipped and reported in
    /// [`ProcessingStats::failures`].
    pub fn process(&mut self, invoices: &[RawInvoice]) -> Result<ProcessingStats> {
        if let Some(gate) = &self.license {
            check_batch(gate.as_ref(), invoices.len())?;
            info!(
                "Starting star-schema processing for {} invoices (license: {})",
                invoices.len(),
                gate.name()
            );
        } else {
            info!("Starting star-schema processing for {} invoices", invoices.len());
        }

        self.reset();

        let mut processed = 0;
        let mut failures = Vec::new();

        for (index, invoice) in invoices.iter().enumerate() {
            match self.resolve(invoice) {
                Ok(resolved) => {
                    self.ingest(resolved);
                    processed += 1;
                }
                Err(e) => {
                    warn!("Skipping invoice #{} ({}): {}", index, display_id(invoice), e);
                    failures.push(InvoiceFailure {
                        index,
                        invoice_id: invoice.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.processed = true;

        let stats = ProcessingStats {
            processed,
            errored: failures.len(),
            total_facts: self.facts.len(),
            dimensions: self.dimension_counts(),
            failures,
            license: self.license_summary(),
        };

        info!(
            processed = stats.processed,
            errored = stats.errored,
            facts = stats.total_facts,
            "Star-schema processing completed"
        );

        Ok(stats)
    }

    /// Project the current batch into the six output tables.
    pub fn export(&self) -> Result<TableSet> {
        if !self.processed {
            return Err(StarError::NotProcessed);
        }

        let format = &self.options.number_format;
        let tables = TableSet::new(vec![
            Table::from_records(FACT_INVOICES, &self.facts, format),
            Table::from_records(DIM_CLIENTS, self.clients.values(), format),
            Table::from_records(DIM_SELLERS, self.sellers.values(), format),
            Table::from_records(DIM_PRODUCTS, self.products.values(), format),
            Table::from_records(DIM_PAYMENTS, self.payments.values(), format),
            Table::from_records(DIM_DATES, self.dates.values(), format),
        ]);

        debug!("Exported tables: {:?}", tables.table_names());
        Ok(tables)
    }

    /// Current counts, usable before or after export.
    pub fn statistics(&self) -> ExportStatistics {
        ExportStatistics {
            facts: self.facts.len(),
            dimensions: self.dimension_counts(),
            license: self.license_summary(),
        }
    }

    pub fn facts(&self) -> &[FactInvoice] {
        &self.facts
    }

    pub fn clients(&self) -> impl Iterator<Item = &DimClient> {
        self.clients.values()
    }

    pub fn sellers(&self) -> impl Iterator<Item = &DimSeller> {
        self.sellers.values()
    }

    pub fn products(&self) -> impl Iterator<Item = &DimProduct> {
        self.products.values()
    }

    pub fn payments(&self) -> impl Iterator<Item = &DimPayment> {
        self.payments.values()
    }

    pub fn dates(&self) -> impl Iterator<Item = &DimDate> {
        self.dates.values()
    }

    pub fn client(&self, client_id: &str) -> Option<&DimClient> {
        self.clients.get(client_id)
    }

    pub fn product(&self, code: &str) -> Option<&DimProduct> {
        self.products.get(code)
    }

    fn dimension_counts(&self) -> DimensionCounts {
        DimensionCounts {
            clients: self.clients.len(),
            sellers: self.sellers.len(),
            products: self.products.len(),
            payments: self.payments.len(),
            dates: self.dates.len(),
        }
    }

    fn license_summary(&self) -> Option<LicenseSummary> {
        self.license.as_deref().map(LicenseSummary::of)
    }

    /// Check and parse every field an invoice contributes, before any table
    /// is modified.
    fn resolve<'a>(&self, invoice: &'a RawInvoice) -> std::result::Result<ResolvedInvoice<'a>, InvoiceError> {
        let date = invoice.check()?;
        let id = invoice.id.as_str();

        let (seller_id, seller_name) = match &invoice.seller {
            Some(seller) if !seller.id.trim().is_empty() => (seller.id.clone(), seller.name.clone()),
            _ => (NO_SELLER.to_string(), "No seller".to_string()),
        };

        let amount = |value: &RawAmount, field: &str| value.to_decimal(id, field);

        let mut items = Vec::with_capacity(invoice.items.len().max(1));
        for (i, item) in invoice.items.iter().enumerate() {
            if item.code.trim().is_empty() {
                return Err(InvoiceError::MissingField {
                    invoice: id.to_string(),
                    field: "items.code",
                });
            }
            items.push(LineItem {
                code: item.code.clone(),
                description: item.description.clone(),
                quantity: amount(&item.quantity, &format!("items[{}].quantity", i))?,
                price: amount(&item.price, &format!("items[{}].price", i))?,
                discount: amount(&item.discount, &format!("items[{}].discount", i))?,
                total: amount(&item.total, &format!("items[{}].total", i))?,
            });
        }
        if items.is_empty() {
            items.push(LineItem {
                code: NO_ITEM.to_string(),
                description: "No items".to_string(),
                quantity: Decimal::ZERO,
                price: Decimal::ZERO,
                discount: Decimal::ZERO,
                total: Decimal::ZERO,
            });
        }

        let mut payments = Vec::with_capacity(invoice.payments.len().max(1));
        for payment in &invoice.payments {
            if payment.id.trim().is_empty() {
                return Err(InvoiceError::MissingField {
                    invoice: id.to_string(),
                    field: "payments.id",
                });
            }
            payments.push(Payment {
                id: payment.id.clone(),
                name: payment.name.clone(),
            });
        }
        if payments.is_empty() {
            payments.push(Payment {
                id: NO_PAYMENT.to_string(),
                name: "No payment".to_string(),
            });
        }

        Ok(ResolvedInvoice {
            raw: invoice,
            date,
            seller_id,
            seller_name,
            subtotal: amount(&invoice.totals.subtotal, "totals.subtotal")?,
            discount: amount(&invoice.totals.discount, "totals.discount")?,
            taxes: amount(&invoice.totals.taxes, "totals.taxes")?,
            total: amount(&invoice.totals.total, "totals.total")?,
            items,
            payments,
        })
    }

    /// Insert dimensions (date, client, seller, products, payments, in that
    /// order) and emit one fact per item × payment.
    fn ingest(&mut self, invoice: ResolvedInvoice<'_>) {
        let raw = invoice.raw;

        let date = DimDate::from_date(invoice.date);
        let date_key = date.date.clone();
        self.dates.entry(date_key.clone()).or_insert(date);

        let extractor = self.extractor;
        self.clients
            .entry(raw.customer.id.clone())
            .or_insert_with(|| {
                let info = extractor.extract_client_info(&raw.observations);
                DimClient {
                    client_id: raw.customer.id.clone(),
                    identification: raw.customer.identification.clone(),
                    name: raw.customer.name.clone(),
                    email: raw.customer.email.clone(),
                    client_type: info.client_type,
                    tax_regime: info.tax_regime,
                }
            });

        let zone = &self.options.seller_zone;
        self.sellers
            .entry(invoice.seller_id.clone())
            .or_insert_with(|| DimSeller {
                seller_id: invoice.seller_id.clone(),
                name: invoice.seller_name.clone(),
                zone: zone.clone(),
            });

        for item in &invoice.items {
            self.products
                .entry(item.code.clone())
                .or_insert_with(|| DimProduct {
                    product_code: item.code.clone(),
                    description: item.description.clone(),
                    category: extractor.extract_product_category(&item.description).to_string(),
                    standard_price: item.price,
                });
        }

        for payment in &invoice.payments {
            self.payments
                .entry(payment.id.clone())
                .or_insert_with(|| DimPayment {
                    payment_id: payment.id.clone(),
                    name: payment.name.clone(),
                    category: extractor.extract_payment_category(&payment.name).to_string(),
                });
        }

        let status = if raw.status.trim().is_empty() {
            UNKNOWN_STATUS.to_string()
        } else {
            raw.status.clone()
        };
        let observations = truncate_chars(&raw.observations, self.options.observations_limit);

        for item in &invoice.items {
            for payment in &invoice.payments {
                self.facts.push(FactInvoice {
                    invoice_id: raw.id.clone(),
                    date: date_key.clone(),
                    client_id: raw.customer.id.clone(),
                    seller_id: invoice.seller_id.clone(),
                    product_code: item.code.clone(),
                    quantity: item.quantity,
                    price: item.price,
                    discount: item.discount,
                    line_total: item.total,
                    payment_id: payment.id.clone(),
                    subtotal: invoice.subtotal,
                    discount_total: invoice.discount,
                    taxes: invoice.taxes,
                    total: invoice.total,
                    status: status.clone(),
                    observations: observations.clone(),
                });
            }
        }

        debug!(
            "Invoice {} expanded into {} facts",
            raw.id,
            invoice.items.len() * invoice.payments.len()
        );
    }
}

impl Default for StarSchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn display_id(invoice: &RawInvoice) -> &str {
    if invoice.id.trim().is_empty() {
        "unknown"
    } else {
        &invoice.id
    }
}
