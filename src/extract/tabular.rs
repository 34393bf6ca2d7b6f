//! Primary-field resolution for structured record sets.
//!
//! Each document class has a designated field (or, for balance sheets, a pair
//! of parallel fields). When none of them is present we fall back to the first
//! all-numeric column, and when there is no numeric column at all we say so
//! instead of failing.

use serde::Serialize;

use crate::domain::{Cell, DocumentClass, RecordSet};

/// How a class picks its designated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Use the first name that is present.
    FirstOf(&'static [&'static str]),
    /// Use every name that is present, each as its own series.
    EachOf(&'static [&'static str]),
}

/// Designated fields per document class.
pub fn field_rule(class: DocumentClass) -> FieldRule {
    match class {
        DocumentClass::Invoice => FieldRule::FirstOf(&["Amount"]),
        DocumentClass::BankStatement => FieldRule::FirstOf(&["Balance"]),
        DocumentClass::Payslip => FieldRule::FirstOf(&["Net Salary"]),
        DocumentClass::BalanceSheet => FieldRule::EachOf(&["Assets", "Liabilities"]),
        DocumentClass::ProfitLoss => FieldRule::FirstOf(&["Profit", "Loss"]),
        DocumentClass::Generic => FieldRule::FirstOf(&["Amount"]),
    }
}

/// How a column was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Designated,
    FirstNumeric,
}

/// Values pulled from one column (nulls dropped, order preserved).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedColumn {
    /// Column name as declared in the record set.
    pub field: String,
    pub source: FieldSource,
    pub values: Vec<f64>,
    pub nulls_dropped: usize,
    /// Text cells found in a designated column.
    pub malformed_dropped: usize,
}

/// Result of resolving a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldResolution {
    /// One or more designated fields were present.
    Designated { columns: Vec<ResolvedColumn> },
    /// No designated field; the first numeric column was used.
    Fallback { column: ResolvedColumn },
    /// Nothing numeric to extract. Reportable, not an error.
    NoNumericField,
}

impl FieldResolution {
    pub fn columns(&self) -> &[ResolvedColumn] {
        match self {
            FieldResolution::Designated { columns } => columns,
            FieldResolution::Fallback { column } => std::slice::from_ref(column),
            FieldResolution::NoNumericField => &[],
        }
    }

    pub fn no_numeric_field(&self) -> bool {
        matches!(self, FieldResolution::NoNumericField)
    }

    /// All resolved values in column order (convenience for single-field classes).
    pub fn values(&self) -> Vec<f64> {
        self.columns()
            .iter()
            .flat_map(|c| c.values.iter().copied())
            .collect()
    }
}

/// Choose the primary numeric field(s) of `records` for `class`.
pub fn resolve_fields(records: &RecordSet, class: DocumentClass) -> FieldResolution {
    let designated: Vec<usize> = match field_rule(class) {
        FieldRule::FirstOf(names) => names
            .iter()
            .find_map(|name| records.column_index(name))
            .into_iter()
            .collect(),
        FieldRule::EachOf(names) => names
            .iter()
            .filter_map(|name| records.column_index(name))
            .collect(),
    };

    if !designated.is_empty() {
        let columns = designated
            .into_iter()
            .map(|idx| collect_column(records, idx, FieldSource::Designated))
            .collect();
        return FieldResolution::Designated { columns };
    }

    match records.numeric_columns().first() {
        Some(&idx) => FieldResolution::Fallback {
            column: collect_column(records, idx, FieldSource::FirstNumeric),
        },
        None => FieldResolution::NoNumericField,
    }
}

fn collect_column(records: &RecordSet, idx: usize, source: FieldSource) -> ResolvedColumn {
    let mut values = Vec::new();
    let mut nulls_dropped = 0;
    let mut malformed_dropped = 0;

    for cell in records.column_cells(idx) {
        match cell {
            Cell::Number(v) if v.is_finite() => values.push(*v),
            Cell::Number(_) | Cell::Null => nulls_dropped += 1,
            Cell::Text(_) => malformed_dropped += 1,
        }
    }

    ResolvedColumn {
        field: records.columns()[idx].clone(),
        source,
        values,
        nulls_dropped,
        malformed_dropped,
    }
}
