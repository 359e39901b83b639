//! On-disk formats: identifier list (JSON) and record table (CSV).

use std::fs;
use std::path::{Path, PathBuf};

use crate::persist::{AtomicFileWriter, PersistError};
use crate::{Identifier, Record};

pub const DEFAULT_IDS_FILENAME: &str = "ids.txt";
pub const DEFAULT_RECORDS_FILENAME: &str = "employees.csv";
/// Cell value for a column the record does not have.
pub const MISSING_FIELD: &str = "0";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("identifier list {path:?} is not a JSON array of strings: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize identifiers: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Writes identifiers as a JSON array of strings, replacing any previous list.
pub fn write_identifiers(
    writer: &AtomicFileWriter,
    filename: &str,
    identifiers: &[Identifier],
) -> Result<PathBuf, ExportError> {
    let json = serde_json::to_string(identifiers)?;
    Ok(writer.write(filename, json.as_bytes())?)
}

pub fn read_identifiers(path: &Path) -> Result<Vec<Identifier>, ExportError> {
    let content = fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Column names: every field seen across `records`, in first-seen order.
pub fn table_columns(records: &[Record]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for field in records.iter().flat_map(Record::fields) {
        if !columns.contains(&field) {
            columns.push(field);
        }
    }
    columns
}

/// Renders records as CSV: a header of [`table_columns`], then one row per
/// record with [`MISSING_FIELD`] in the cells it lacks.
pub fn render_records_csv(records: &[Record]) -> String {
    let columns = table_columns(records);
    let mut out = String::new();
    push_row(&mut out, columns.iter().copied());
    for record in records {
        push_row(
            &mut out,
            columns
                .iter()
                .map(|column| record.get(column).unwrap_or(MISSING_FIELD)),
        );
    }
    out
}

pub fn write_records(
    writer: &AtomicFileWriter,
    filename: &str,
    records: &[Record],
) -> Result<PathBuf, ExportError> {
    Ok(writer.write(filename, render_records_csv(records).as_bytes())?)
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_cell(out, cell);
    }
    out.push_str("\r\n");
}

fn push_cell(out: &mut String, cell: &str) {
    if cell.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}
