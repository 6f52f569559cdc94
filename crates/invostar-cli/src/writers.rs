//! File-backed table writers.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use invostar_core::error::StarError;
use invostar_core::models::config::TableFormat;
use invostar_core::{Result, Table, TableWriter};

/// Writes each table to `<dir>/<name>.csv` with a header row.
pub struct CsvTableWriter {
    dir: PathBuf,
}

impl CsvTableWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TableWriter for CsvTableWriter {
    fn write_table(&mut self, table: &Table) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.csv", table.name));

        let mut wtr = csv::Writer::from_path(&path).map_err(csv_error)?;
        wtr.write_record(&table.headers).map_err(csv_error)?;
        for record in table.records() {
            wtr.write_record(&record).map_err(csv_error)?;
        }
        wtr.flush()?;

        debug!("Wrote {} rows to {}", table.len(), path.display());
        Ok(path)
    }
}

/// Writes each table to `<dir>/<name>.json` as an array of objects.
pub struct JsonTableWriter {
    dir: PathBuf,
}

impl JsonTableWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TableWriter for JsonTableWriter {
    fn write_table(&mut self, table: &Table) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.json", table.name));

        fs::write(&path, serde_json::to_string_pretty(&table.rows)?)?;

        debug!("Wrote {} rows to {}", table.len(), path.display());
        Ok(path)
    }
}

/// Writer for the configured format.
pub fn writer_for(format: TableFormat, dir: &Path) -> Box<dyn TableWriter> {
    match format {
        TableFormat::Csv => Box::new(CsvTableWriter::new(dir)),
        TableFormat::Json => Box::new(JsonTableWriter::new(dir)),
    }
}

fn csv_error(e: csv::Error) -> StarError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => StarError::Io(io),
        other => StarError::Config(format!("CSV error: {:?}", other)),
    }
}
