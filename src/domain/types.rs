//! Shared domain types.
//!
//! These types are intentionally kept plain and serializable so they can be:
//!
//! - passed between the extraction, statistics and scoring stages
//! - exported to JSON for whatever front-end renders them
//! - constructed directly in tests without going through file I/O

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Declared type of a financial document.
///
/// The class only decides which field name the tabular resolver prefers; it
/// never prevents extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentClass {
    Invoice,
    BankStatement,
    Payslip,
    BalanceSheet,
    ProfitLoss,
    Generic,
}

impl DocumentClass {
    pub const ALL: [DocumentClass; 6] = [
        DocumentClass::Invoice,
        DocumentClass::BankStatement,
        DocumentClass::Payslip,
        DocumentClass::BalanceSheet,
        DocumentClass::ProfitLoss,
        DocumentClass::Generic,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            DocumentClass::Invoice => "Invoices",
            DocumentClass::BankStatement => "Bank Statements",
            DocumentClass::Payslip => "Payslips",
            DocumentClass::BalanceSheet => "Balance Sheets",
            DocumentClass::ProfitLoss => "Profit/Loss Statements",
            DocumentClass::Generic => "Documents",
        }
    }
}

/// A single cell of a structured record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// An ordered list of named-field rows.
///
/// Every row has exactly `columns.len()` cells; short rows are padded with
/// `Cell::Null` and long rows truncated on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut set = Self::new(columns);
        for row in rows {
            set.push_row(row);
        }
        set
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name, ignoring surrounding whitespace, a leading BOM
    /// and ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header_name(name);
        self.columns
            .iter()
            .position(|c| normalize_header_name(c) == wanted)
    }

    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Column values with everything that is not a number mapped to `None`.
    pub fn numeric_column(&self, idx: usize) -> Vec<Option<f64>> {
        self.column_cells(idx).map(Cell::as_number).collect()
    }

    /// A column is numeric when it holds at least one number and no text.
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        let mut any_number = false;
        for cell in self.column_cells(idx) {
            match cell {
                Cell::Number(_) => any_number = true,
                Cell::Text(_) => return false,
                Cell::Null => {}
            }
        }
        any_number
    }

    /// Indices of numeric columns, in declaration order.
    pub fn numeric_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&idx| self.is_numeric_column(idx))
            .collect()
    }
}

pub fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_ascii_lowercase()
}

/// Raw content of one submitted document.
#[derive(Debug, Clone)]
pub enum DocumentContent {
    /// Structured rows (e.g. a CSV upload).
    Table(RecordSet),
    /// Free-form text already recovered by an external OCR service.
    Text(String),
    /// A format this crate cannot read (images, PDFs, Word files).
    Unsupported { extension: String },
}

/// A document submitted for analysis.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub class: DocumentClass,
    pub content: DocumentContent,
}

/// Where an observation came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    TabularField { field: String },
    OcrToken,
}

/// One numeric value with provenance. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    value: f64,
    source: String,
    class: DocumentClass,
    origin: Origin,
}

impl Observation {
    pub fn new(value: f64, source: impl Into<String>, class: DocumentClass, origin: Origin) -> Self {
        Self {
            value,
            source: source.into(),
            class,
            origin,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn class(&self) -> DocumentClass {
        self.class
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// An ordered sequence of observations (insertion order = processing order).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationSet {
    pub label: String,
    observations: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            observations: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(Observation::value).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Why a derived product could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unavailable {
    /// No usable values at all.
    NoData,
    /// Some values, but fewer than the computation needs.
    InsufficientData { required: usize, available: usize },
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unavailable::NoData => write!(f, "insufficient data (no values)"),
            Unavailable::InsufficientData { required, available } => write!(
                f,
                "insufficient data ({available} value(s), at least {required} required)"
            ),
        }
    }
}

/// Result of a computation that may lack data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ready(T),
    Unavailable(Unavailable),
}

impl<T> Outcome<T> {
    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Outcome::Ready(v) => Some(v),
            Outcome::Unavailable(_) => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Outcome::Ready(v) => Some(v),
            Outcome::Unavailable(_) => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<Unavailable> {
        match self {
            Outcome::Ready(_) => None,
            Outcome::Unavailable(reason) => Some(*reason),
        }
    }
}

/// A prior loan declared by an applicant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorLoan {
    /// Principal of the earlier loan (INR).
    pub amount: f64,
    /// Number of missed EMI installments.
    pub emi_bounces: u32,
}

/// Applicant-supplied attributes for the loan recommendation flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    /// 0–100.
    pub academic_score: f64,
    /// 300–850.
    pub credit_score: f64,
    /// Parents' annual income (INR). Informational; not part of the score.
    pub annual_income: f64,
    /// 12th-grade percentage, 0–100.
    pub marks_12: f64,
    /// Undergraduate percentage, present only when the applicant opts in.
    pub ug_marks: Option<f64>,
    pub prior_loan: Option<PriorLoan>,
}

/// A loan catalog entry.
///
/// The eligibility thresholds are descriptive metadata; the tiered
/// recommendation never consults them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub name: String,
    pub min_academic_score: f64,
    pub min_credit_score: f64,
    pub max_annual_income: f64,
    pub description: String,
    pub tenure: String,
    pub interest_rate: String,
}

/// One of the three fixed score ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    pub fn display_name(self) -> &'static str {
        match self {
            RiskTier::Low => "low (< 20)",
            RiskTier::Moderate => "moderate (20-40)",
            RiskTier::High => "high (>= 40)",
        }
    }
}

/// Score plus the products recommended for it, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub tier: RiskTier,
    pub recommended: Vec<LoanProduct>,
}

/// Options for a multi-document analysis run, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub class: DocumentClass,
    pub files: Vec<PathBuf>,
    pub histogram_bins: usize,
    pub export_json: Option<PathBuf>,
}
