//! Result exports.
//!
//! - JSON for structured analysis results (anything `Serialize`)
//! - CSV for a clustered table: the input columns plus a trailing `Cluster`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::{Cell, RecordSet};
use crate::error::AppError;

pub const CLUSTER_COLUMN: &str = "Cluster";

/// Write `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::internal(format!("Failed to create JSON export '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| AppError::internal(format!("Failed to write JSON export: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::internal(format!("Failed to write JSON export: {e}")))?;

    info!(path = %path.display(), "wrote JSON export");
    Ok(())
}

/// Write `records` with one cluster id per row; rows without a label get an empty cell.
pub fn write_clusters_csv(path: &Path, records: &RecordSet, labels: &[Option<usize>]) -> Result<(), AppError> {
    if labels.len() != records.row_count() {
        return Err(AppError::internal(format!(
            "Cluster labels ({}) do not match table rows ({}).",
            labels.len(),
            records.row_count()
        )));
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::internal(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let mut header: Vec<&str> = records.columns().iter().map(String::as_str).collect();
    header.push(CLUSTER_COLUMN);
    writer
        .write_record(&header)
        .map_err(|e| AppError::internal(format!("Failed to write export CSV header: {e}")))?;

    let width = records.columns().len();
    for (row, label) in records.rows().iter().zip(labels) {
        let mut fields: Vec<String> = row.iter().take(width).map(cell_text).collect();
        fields.push(label.map(|l| l.to_string()).unwrap_or_default());
        writer
            .write_record(&fields)
            .map_err(|e| AppError::internal(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::internal(format!("Failed to write export CSV: {e}")))?;

    info!(path = %path.display(), rows = labels.len(), "wrote cluster export");
    Ok(())
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Number(v) => v.to_string(),
        Cell::Text(s) => s.clone(),
        Cell::Null => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_csv_appends_label_column() {
        let records = RecordSet::from_rows(
            vec!["Name".to_string(), "Amount".to_string()],
            vec![
                vec![Cell::Text("a".to_string()), Cell::Number(10.0)],
                vec![Cell::Text("b".to_string()), Cell::Null],
                vec![Cell::Text("c".to_string()), Cell::Number(2.5)],
            ],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.csv");

        write_clusters_csv(&path, &records, &[Some(1), None, Some(0)]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Name,Amount,Cluster\na,10,1\nb,,\nc,2.5,0\n");
    }

    #[test]
    fn mismatched_labels_are_rejected() {
        let records = RecordSet::from_rows(vec!["x".to_string()], vec![vec![Cell::Number(1.0)]]);
        let dir = tempfile::tempdir().unwrap();
        let err = write_clusters_csv(&dir.path().join("out.csv"), &records, &[]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INTERNAL);
    }

    #[test]
    fn json_export_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &vec![1.5, 2.0]).unwrap();
        let back: Vec<f64> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![1.5, 2.0]);
    }
}
