use std::collections::BTreeSet;

use invostar_core::extract::{extract_client_info, extract_payment_category};
use invostar_core::schema::table::{DIM_CLIENTS, DIM_PRODUCTS, FACT_INVOICES};
use invostar_core::{
    load_invoices, LicenseTier, RawInvoice, StarError, StarSchemaBuilder, TierLicense,
};
use pretty_assertions::assert_eq;

fn batch() -> Vec<RawInvoice> {
    let json = r#"[
        {
            "id": "A",
            "date": "2024-09-15T10:30:00Z",
            "status": "Open",
            "observations": "Cliente PERSONA NATURAL - Régimen SIMPLIFICADO",
            "customer": { "id": 1, "identification": "123", "name": "Juan Pérez", "email": "juan@example.com" },
            "seller": { "id": 10, "name": "Ana" },
            "totals": { "subtotal": 150000, "discount": 0, "taxes": 28500, "total": 178500 },
            "items": [
                { "code": "PROD001", "description": "Producto 1", "quantity": 2, "price": 50000, "total": 100000 },
                { "code": "PROD002", "description": "Servicio de instalación", "quantity": 1, "price": 50000, "total": 50000 }
            ],
            "payments": [ { "id": "PAY001", "name": "Efectivo", "value": 178500 } ]
        },
        {
            "id": "B",
            "date": "2024-09-16",
            "status": "Paid",
            "observations": "Empresa S.A.S., gran contribuyente",
            "customer": { "id": "1", "name": "Otro nombre" },
            "seller": { "id": 10, "name": "Ana" },
            "totals": { "subtotal": "80000", "total": "95200" },
            "items": [
                { "code": "PROD003", "description": "Curso de Excel", "quantity": 1, "price": 80000, "total": 80000 }
            ],
            "payments": [
                { "id": "PAY002", "name": "Tarjeta VISA", "value": 50000 },
                { "id": "PAY003", "name": "Transferencia", "value": 45200 }
            ]
        }
    ]"#;

    load_invoices(json.as_bytes()).unwrap()
}

fn fact_rows(builder: &StarSchemaBuilder) -> BTreeSet<Vec<String>> {
    let tables = builder.export().unwrap();
    tables
        .get(FACT_INVOICES)
        .unwrap()
        .records()
        .map(|r| r.into_iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn two_invoice_batch_scenario() {
    let mut builder = StarSchemaBuilder::new();
    let stats = builder.process(&batch()).unwrap();

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.errored, 0);
    assert_eq!(stats.total_facts, 4);
    assert_eq!(stats.dimensions.clients, 1);
    assert_eq!(stats.dimensions.products, 3);
    assert_eq!(stats.dimensions.payments, 3);
    assert_eq!(stats.dimensions.sellers, 1);
    assert_eq!(stats.dimensions.dates, 2);
}

#[test]
fn cartesian_law_holds_per_invoice() {
    let invoices = batch();
    let mut builder = StarSchemaBuilder::new();
    builder.process(&invoices).unwrap();

    for invoice in &invoices {
        let expected = invoice.items.len().max(1) * invoice.payments.len().max(1);
        let actual = builder
            .facts()
            .iter()
            .filter(|f| f.invoice_id == invoice.id)
            .count();
        assert_eq!(actual, expected, "invoice {}", invoice.id);
    }
}

#[test]
fn shared_client_keeps_first_attributes() {
    let mut builder = StarSchemaBuilder::new();
    builder.process(&batch()).unwrap();

    let tables = builder.export().unwrap();
    let clients = tables.get(DIM_CLIENTS).unwrap();

    assert_eq!(clients.len(), 1);
    assert_eq!(clients.rows[0]["client_id"], "1");
    assert_eq!(clients.rows[0]["name"], "Juan Pérez");
    assert_eq!(clients.rows[0]["client_type"], "Persona Natural");
    assert_eq!(clients.rows[0]["tax_regime"], "Régimen Simplificado");
}

#[test]
fn zero_items_yield_one_row_per_payment() {
    let mut invoices = batch();
    invoices[1].items.clear();

    let mut builder = StarSchemaBuilder::new();
    builder.process(&invoices).unwrap();

    let rows: Vec<_> = builder.facts().iter().filter(|f| f.invoice_id == "B").collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|f| f.product_code == "NO_ITEM"));

    let products = builder.export().unwrap();
    let codes: Vec<&str> = products.get(DIM_PRODUCTS).unwrap().column("product_code").collect();
    assert!(codes.contains(&"NO_ITEM"));
}

#[test]
fn processing_is_deterministic() {
    let invoices = batch();

    let mut first = StarSchemaBuilder::new();
    first.process(&invoices).unwrap();
    let mut second = StarSchemaBuilder::new();
    second.process(&invoices).unwrap();

    assert_eq!(first.export().unwrap(), second.export().unwrap());
    assert_eq!(fact_rows(&first), fact_rows(&second));

    // Re-running on the same builder gives the same tables as a fresh one.
    first.process(&invoices).unwrap();
    assert_eq!(first.export().unwrap(), second.export().unwrap());
}

#[test]
fn license_gate_boundary() {
    let invoices = batch();
    let max = invoices.len();

    let mut builder =
        StarSchemaBuilder::new().with_license(TierLicense::new(LicenseTier::Pro).with_max_records(max));
    assert!(builder.process(&invoices).is_ok());

    let mut builder = StarSchemaBuilder::new()
        .with_license(TierLicense::new(LicenseTier::Pro).with_max_records(max - 1));
    let err = builder.process(&invoices).unwrap_err();
    assert!(matches!(err, StarError::LicenseLimitExceeded { .. }));
    let message = err.to_string();
    assert!(message.contains(&format!("at most {}", max - 1)));
    assert!(message.contains(&format!("requested {}", max)));
    assert!(matches!(builder.export(), Err(StarError::NotProcessed)));
}

#[test]
fn free_license_cannot_export() {
    let mut builder = StarSchemaBuilder::new().with_license(TierLicense::new(LicenseTier::Free));
    let err = builder.process(&batch()).unwrap_err();
    assert!(matches!(err, StarError::FeatureUnavailable { .. }));
}

#[test]
fn empty_export_is_invalid() {
    let mut builder = StarSchemaBuilder::new();
    builder.process(&[]).unwrap();

    let tables = builder.export().unwrap();
    assert!(tables.iter().all(|t| t.is_empty()));

    let validation = builder.validate().unwrap();
    assert!(!validation.valid);
    assert!(validation.errors.iter().any(|e| e.contains("fact")));
}

#[test]
fn extraction_scenarios() {
    let info = extract_client_info("Cliente PERSONA NATURAL - Régimen SIMPLIFICADO");
    assert_eq!(info.client_type, "Persona Natural");
    assert_eq!(info.tax_regime, "Régimen Simplificado");

    assert_eq!(extract_payment_category(""), "Not Specified");
    assert_eq!(extract_payment_category("Mystery Pay"), "Other");
}

#[test]
fn stats_serialize_to_json() {
    let mut builder = StarSchemaBuilder::new().with_license(TierLicense::new(LicenseTier::Enterprise));
    let stats = builder.process(&batch()).unwrap();

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["total_facts"], 4);
    assert_eq!(json["license"]["license"], "ENTERPRISE");
    assert!(json["license"]["max_records"].is_null());
}

#[test]
fn null_and_mistyped_sections_fail_only_their_invoice() {
    let json = r#"[
        {
            "id": "A",
            "date": "2024-09-15",
            "customer": { "id": 1 },
            "items": [ { "code": "P1", "quantity": 1, "price": 10, "total": 10 } ],
            "payments": [ { "id": "PAY1", "name": "Efectivo" } ]
        },
        { "id": "B", "date": "2024-09-15", "customer": null, "items": null, "totals": null },
        { "id": "C", "date": "2024-09-15", "customer": { "id": 3 }, "items": { "code": "P9" } }
    ]"#;

    let invoices = load_invoices(json.as_bytes()).unwrap();
    assert_eq!(invoices.len(), 3);

    let mut builder = StarSchemaBuilder::new();
    let stats = builder.process(&invoices).unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errored, 2);
    assert_eq!(stats.total_facts, 1);
    let failed: Vec<&str> = stats.failures.iter().map(|f| f.invoice_id.as_str()).collect();
    assert_eq!(failed, vec!["B", "C"]);
    assert!(stats.failures[0].reason.contains("customer.id"));
    assert!(stats.failures[1].reason.contains("malformed"));
}
