//! Finished tables and the contract for persisting them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::dimensions::{NumberFormat, Row, TableRow};

pub const FACT_INVOICES: &str = "fact_invoices";
pub const DIM_CLIENTS: &str = "dim_clients";
pub const DIM_SELLERS: &str = "dim_sellers";
pub const DIM_PRODUCTS: &str = "dim_products";
pub const DIM_PAYMENTS: &str = "dim_payments";
pub const DIM_DATES: &str = "dim_dates";

/// Logical table names in output order.
pub const TABLE_NAMES: [&str; 6] = [
    FACT_INVOICES,
    DIM_CLIENTS,
    DIM_SELLERS,
    DIM_PRODUCTS,
    DIM_PAYMENTS,
    DIM_DATES,
];

/// A named table: headers plus rows keyed by header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Project records of one kind into a table.
    pub fn from_records<'a, T, I>(name: &str, records: I, format: &NumberFormat) -> Self
    where
        T: TableRow + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        Self {
            name: name.to_string(),
            headers: T::headers().iter().map(|h| h.to_string()).collect(),
            rows: records.into_iter().map(|r| r.to_row(format)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as value lists in header order; missing cells are empty.
    pub fn records(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        self.rows.iter().map(move |row| {
            self.headers
                .iter()
                .map(|h| row.get(h).map(String::as_str).unwrap_or(""))
                .collect()
        })
    }

    /// Values of one column, in row order.
    pub fn column<'a>(&'a self, header: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(header).map(String::as_str).unwrap_or(""))
    }
}

/// The six tables of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSet {
    tables: Vec<Table>,
}

impl TableSet {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<'a> IntoIterator for &'a TableSet {
    type Item = &'a Table;
    type IntoIter = std::slice::Iter<'a, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

/// Outcome of writing one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub table: String,
    /// Destination on success.
    pub path: Option<PathBuf>,
    /// Failure message otherwise.
    pub error: Option<String>,
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-table results of persisting a [`TableSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    pub outcomes: Vec<WriteOutcome>,
}

impl WriteReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(WriteOutcome::is_success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &WriteOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Persists finished tables (CSV files, JSON files, a database, ...).
pub trait TableWriter {
    /// Write one table and return where it went.
    fn write_table(&mut self, table: &Table) -> Result<PathBuf>;

    /// Write every table. A failing table does not stop the others.
    fn write_all(&mut self, tables: &TableSet) -> WriteReport {
        let outcomes = tables
            .iter()
            .map(|table| match self.write_table(table) {
                Ok(path) => WriteOutcome {
                    table: table.name.clone(),
                    path: Some(path),
                    error: None,
                },
                Err(e) => WriteOutcome {
                    table: table.name.clone(),
                    path: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        WriteReport { outcomes }
    }
}
