//! Shared workflows behind the CLI commands.
//!
//! Each `run_*` function does the loading and computation for one command and
//! returns a plain output struct; printing and exporting stay in `app`.
//!
//! analyze: load documents -> extract + merge observations -> per-series stats
//! column:  load CSV -> pick a numeric column -> stats
//! cluster: load CSV -> pick a numeric column -> k-means
//! prices:  load CSVs -> date/close series -> summaries

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{AnalysisConfig, DocumentClass, ObservationSet, Outcome, RecordSet};
use crate::error::AppError;
use crate::extract::{DocumentReport, LoadFailure, build_observations_from, extract_document};
use crate::io::documents::{document_name, load_document};
use crate::io::ingest::read_table;
use crate::market::{PriceSeries, SeriesSummary, load_price_series, summarize};
use crate::stats::{
    Bin, BoxStats, BucketView, ClusterAssignment, DEFAULT_HISTOGRAM_BINS, Summary, box_stats, bucketize,
    cluster_column, cluster_values, describe, histogram,
};

/// Every derived product for one numeric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesAnalysis {
    pub label: String,
    pub count: usize,
    pub summary: Outcome<Summary>,
    pub box_stats: Outcome<BoxStats>,
    pub histogram: Outcome<Vec<Bin>>,
    pub buckets: Outcome<BucketView>,
    pub clusters: Outcome<ClusterAssignment>,
}

/// Output of `finscan analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutput {
    pub class: DocumentClass,
    /// The merged series first, then parallel series; empty series are omitted.
    pub series: Vec<SeriesAnalysis>,
    pub documents: Vec<DocumentReport>,
}

impl AnalysisOutput {
    pub fn has_data(&self) -> bool {
        !self.series.is_empty()
    }
}

/// Output of `finscan column`.
#[derive(Debug, Clone)]
pub struct ColumnOutput {
    pub file: String,
    pub column: String,
    pub nulls: usize,
    pub analysis: SeriesAnalysis,
}

/// Output of `finscan cluster`.
#[derive(Debug, Clone)]
pub struct ClusterOutput {
    pub file: String,
    pub column: String,
    pub records: RecordSet,
    pub assignment: Outcome<ClusterAssignment>,
}

/// Output of `finscan prices`.
#[derive(Debug, Clone)]
pub struct PricesOutput {
    pub series: Vec<(PriceSeries, Outcome<SeriesSummary>)>,
    /// Files that could not be used, with the reason.
    pub failures: Vec<(String, String)>,
}

/// Run the multi-document analysis.
///
/// Unreadable files become `ReadFailed` notes rather than errors, so one bad
/// upload does not hide the others.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisOutput, AppError> {
    if config.files.is_empty() {
        return Err(AppError::input("No input files given."));
    }
    if config.histogram_bins == 0 {
        return Err(AppError::input("Histogram bin count must be at least 1."));
    }

    let observations = build_observations_from(&config.files, |path| {
        load_document(path, config.class)
            .map(|doc| extract_document(&doc))
            .map_err(|err| {
                warn!(path = %path.display(), error = %err, "document could not be read");
                LoadFailure {
                    name: document_name(path),
                    class: config.class,
                    message: err.message().to_string(),
                }
            })
    });

    let series = observations
        .analysable_sets()
        .into_iter()
        .map(|set| analyse_set(set, config.histogram_bins))
        .collect();

    Ok(AnalysisOutput {
        class: config.class,
        series,
        documents: observations.documents,
    })
}

pub fn analyse_set(set: &ObservationSet, bins: usize) -> SeriesAnalysis {
    analyse_values(&set.label, &set.values(), bins)
}

pub fn analyse_values(label: &str, values: &[f64], bins: usize) -> SeriesAnalysis {
    SeriesAnalysis {
        label: label.to_string(),
        count: values.len(),
        summary: describe(values),
        box_stats: box_stats(values),
        histogram: histogram(values, bins),
        buckets: bucketize(values),
        clusters: cluster_values(values),
    }
}

/// Summarise one column of a CSV (the first numeric column if none is named).
pub fn run_column(path: &Path, column: Option<&str>) -> Result<ColumnOutput, AppError> {
    let records = read_table(path)?.records;
    let idx = select_column(&records, column)?;
    let name = records.columns()[idx].clone();

    let cells = records.numeric_column(idx);
    let nulls = cells.iter().filter(|v| v.is_none()).count();
    let values: Vec<f64> = cells.into_iter().flatten().collect();
    info!(column = %name, values = values.len(), nulls, "column selected");

    Ok(ColumnOutput {
        file: document_name(path),
        analysis: analyse_values(&name, &values, DEFAULT_HISTOGRAM_BINS),
        column: name,
        nulls,
    })
}

/// Cluster one column of a CSV; rows without a value stay unlabelled.
pub fn run_cluster(path: &Path, column: Option<&str>) -> Result<ClusterOutput, AppError> {
    let records = read_table(path)?.records;
    let idx = select_column(&records, column)?;
    let assignment = cluster_column(&records.numeric_column(idx));

    Ok(ClusterOutput {
        file: document_name(path),
        column: records.columns()[idx].clone(),
        records,
        assignment,
    })
}

pub fn run_prices(paths: &[PathBuf]) -> Result<PricesOutput, AppError> {
    if paths.is_empty() {
        return Err(AppError::input("No input files given."));
    }

    let mut series = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match load_price_series(path) {
            Ok(s) => {
                let summary = summarize(&s);
                series.push((s, summary));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "price file skipped");
                failures.push((document_name(path), err.message().to_string()));
            }
        }
    }

    Ok(PricesOutput { series, failures })
}

/// Resolve the column to analyse: by name when given (it must be numeric),
/// otherwise the first numeric column.
pub fn select_column(records: &RecordSet, column: Option<&str>) -> Result<usize, AppError> {
    match column {
        Some(name) => {
            let idx = records
                .column_index(name)
                .ok_or_else(|| AppError::input(format!("Column '{name}' not found.")))?;
            if !records.is_numeric_column(idx) {
                return Err(AppError::input(format!("Column '{name}' is not numeric.")));
            }
            Ok(idx)
        }
        None => records
            .numeric_columns()
            .first()
            .copied()
            .ok_or_else(|| AppError::no_data("No numeric columns found.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Unavailable;
    use crate::extract::DocumentDetail;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn config(class: DocumentClass, files: Vec<PathBuf>) -> AnalysisConfig {
        AnalysisConfig {
            class,
            files,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            export_json: None,
        }
    }

    #[test]
    fn analysis_merges_tables_and_text_in_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_file(&dir, "a.csv", "Item,Amount\npen,10\nink,20\n"),
            write_file(&dir, "b.txt", "Total due 30.00 and 40.50"),
            write_file(&dir, "c.png", "binary"),
        ];

        let out = run_analysis(&config(DocumentClass::Invoice, files)).unwrap();
        assert!(out.has_data());
        assert_eq!(out.series.len(), 1);
        let merged = &out.series[0];
        assert_eq!(merged.count, 4);
        assert!((merged.summary.as_ready().unwrap().mean - 25.125).abs() < 1e-9);
        assert!(matches!(
            out.documents[2].detail,
            DocumentDetail::Unsupported { ref extension } if extension == "png"
        ));
    }

    #[test]
    fn unreadable_file_is_a_note_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            dir.path().join("missing.csv"),
            write_file(&dir, "ok.csv", "Amount\n5\n"),
        ];
        let out = run_analysis(&config(DocumentClass::Invoice, files)).unwrap();
        assert!(matches!(out.documents[0].detail, DocumentDetail::ReadFailed { .. }));
        assert_eq!(out.documents[0].name, "missing.csv");
        assert_eq!(out.documents[1].name, "ok.csv");
        assert_eq!(out.series[0].count, 1);
        assert_eq!(
            out.series[0].clusters.unavailable_reason(),
            Some(Unavailable::InsufficientData {
                required: 3,
                available: 1
            })
        );
    }

    #[test]
    fn balance_sheet_yields_parallel_series() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write_file(&dir, "bs.csv", "Assets,Liabilities\n100,40\n200,60\n")];
        let out = run_analysis(&config(DocumentClass::BalanceSheet, files)).unwrap();
        let labels: Vec<&str> = out.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Assets", "Liabilities"]);
    }

    #[test]
    fn nothing_numeric_has_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write_file(&dir, "note.txt", "no amounts here")];
        let out = run_analysis(&config(DocumentClass::Generic, files)).unwrap();
        assert!(!out.has_data());
        assert_eq!(out.documents.len(), 1);
    }

    #[test]
    fn column_defaults_to_first_numeric() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "t.csv", "Name,Score,Age\na,1,30\nb,,40\nc,3,50\n");
        let out = run_column(&path, None).unwrap();
        assert_eq!(out.column, "Score");
        assert_eq!(out.nulls, 1);
        assert_eq!(out.analysis.count, 2);

        let err = run_column(&path, Some("Name")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(run_column(&path, Some("nope")).is_err());
    }

    #[test]
    fn cluster_keeps_unlabelled_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "t.csv", "id,v\na,1\nb,2\nc,\nd,10\ne,11\nf,50\n");
        let out = run_cluster(&path, Some("v")).unwrap();
        let assignment = out.assignment.into_ready().unwrap();
        assert_eq!(assignment.labels.len(), out.records.row_count());
        assert_eq!(assignment.labels[2], None);
        assert_eq!(assignment.labels[0], Some(0));
        assert_eq!(assignment.labels[5], Some(2));
    }

    #[test]
    fn prices_collect_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(&dir, "good.csv", "Date,Close\n2024-01-02,2\n2024-01-01,1\n");
        let bad = write_file(&dir, "bad.csv", "Day,Price\n2024-01-01,1\n");
        let out = run_prices(&[good, bad]).unwrap();
        assert_eq!(out.series.len(), 1);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].0, "bad.csv");
    }
}
