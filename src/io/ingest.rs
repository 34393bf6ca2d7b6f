//! CSV ingest into typed record sets.
//!
//! Every cell becomes a number, text, or null. The usual spreadsheet "missing"
//! spellings (`NA`, `N/A`, `null`, `NaN`, ...) are nulls, so a column of
//! numbers with gaps still counts as numeric.
//!
//! Rows the CSV reader cannot parse are skipped and reported; they never abort
//! the ingest.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::{Cell, RecordSet};
use crate::error::AppError;

const NA_TOKENS: [&str; 17] = [
    "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan",
    "null", "1.#IND", "1.#QNAN", "-1.#IND",
];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the parsed table plus rows that had to be skipped.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub records: RecordSet,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

pub fn read_table(path: &Path) -> Result<IngestedTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let table = read_table_from(file)
        .map_err(|e| AppError::input(format!("{} ({})", e.message(), path.display())))?;

    if !table.row_errors.is_empty() {
        warn!(
            path = %path.display(),
            skipped = table.row_errors.len(),
            "skipped unreadable CSV rows"
        );
    }
    debug!(
        path = %path.display(),
        rows = table.records.row_count(),
        columns = table.records.columns().len(),
        "read CSV"
    );
    Ok(table)
}

pub fn read_table_from<R: Read>(input: R) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut records = RecordSet::new(columns);
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        match result {
            Ok(record) => records.push_row(record.iter().map(parse_cell).collect()),
            Err(e) => row_errors.push(RowError {
                line,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    Ok(IngestedTable {
        records,
        row_errors,
        rows_read,
    })
}

pub fn parse_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() || NA_TOKENS.contains(&s) {
        return Cell::Null;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Number(v),
        Ok(_) => Cell::Null,
        Err(_) => Cell::Text(s.to_string()),
    }
}
