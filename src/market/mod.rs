//! Closing-price series.
//!
//! Each CSV must carry a `Date` and a `Close` column. Rows whose date or close
//! cannot be parsed are skipped and reported with their line number, and the
//! remaining points are sorted by date (stable, so same-day rows keep file
//! order).

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Cell, Outcome, RecordSet, Unavailable};
use crate::error::AppError;
use crate::io::documents::document_name;
use crate::io::ingest::{RowError, read_table};

pub const DATE_COLUMN: &str = "Date";
pub const CLOSE_COLUMN: &str = "Close";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub name: String,
    /// Ascending by date.
    pub points: Vec<PricePoint>,
    pub row_errors: Vec<RowError>,
}

/// First/last/extremes of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub points: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub first_close: f64,
    pub last_close: f64,
    /// Percent change from first to last close; absent when the first close is zero.
    pub change_pct: Option<f64>,
    pub min_close: f64,
    pub max_close: f64,
}

pub fn load_price_series(path: &Path) -> Result<PriceSeries, AppError> {
    let table = read_table(path)?;
    let mut series = series_from_records(document_name(path), &table.records)?;
    series.row_errors.extend(table.row_errors);
    series.row_errors.sort_by_key(|e| e.line);
    Ok(series)
}

/// Build a series from an already-ingested table.
pub fn series_from_records(name: impl Into<String>, records: &RecordSet) -> Result<PriceSeries, AppError> {
    let name = name.into();
    let (Some(date_idx), Some(close_idx)) = (
        records.column_index(DATE_COLUMN),
        records.column_index(CLOSE_COLUMN),
    ) else {
        return Err(AppError::input(format!(
            "'{name}' must contain '{DATE_COLUMN}' and '{CLOSE_COLUMN}' columns."
        )));
    };

    let mut points = Vec::with_capacity(records.row_count());
    let mut row_errors = Vec::new();

    for (idx, row) in records.rows().iter().enumerate() {
        let line = idx + 2;
        let date = match &row[date_idx] {
            Cell::Text(s) => parse_date(s),
            Cell::Number(v) if v.fract() == 0.0 => parse_date(&format!("{}", *v as i64)),
            Cell::Number(v) => Err(format!("Invalid date '{v}'.")),
            Cell::Null => Err("Missing date.".to_string()),
        };
        let close = match &row[close_idx] {
            Cell::Number(v) => Ok(*v),
            Cell::Text(s) => Err(format!("Invalid close '{s}'.")),
            Cell::Null => Err("Missing close.".to_string()),
        };

        match (date, close) {
            (Ok(date), Ok(close)) => points.push(PricePoint { date, close }),
            (Err(message), _) | (_, Err(message)) => row_errors.push(RowError { line, message }),
        }
    }

    points.sort_by_key(|p| p.date);

    if !row_errors.is_empty() {
        warn!(series = %name, skipped = row_errors.len(), "skipped price rows");
    }
    debug!(series = %name, points = points.len(), "price series loaded");

    Ok(PriceSeries {
        name,
        points,
        row_errors,
    })
}

pub fn summarize(series: &PriceSeries) -> Outcome<SeriesSummary> {
    let (Some(first), Some(last)) = (series.points.first(), series.points.last()) else {
        return Outcome::Unavailable(Unavailable::NoData);
    };

    let mut min_close = f64::INFINITY;
    let mut max_close = f64::NEG_INFINITY;
    for p in &series.points {
        min_close = min_close.min(p.close);
        max_close = max_close.max(p.close);
    }

    let change_pct = (first.close != 0.0).then(|| (last.close - first.close) / first.close * 100.0);

    Outcome::Ready(SeriesSummary {
        points: series.points.len(),
        first_date: first.date,
        last_date: last.date,
        first_close: first.close,
        last_close: last.close,
        change_pct,
        min_close,
        max_close,
    })
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%Y%m%d"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    let s = s.trim();
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD, YYYYMMDD."
    ))
}
