//! Plain-text terminal rendering.
//!
//! Every function returns a `String`; nothing here prints. Tables are
//! fixed-width with trailing whitespace trimmed, and unavailable results are
//! rendered as a one-line reason instead of an empty table.

use crate::app::pipeline::{AnalysisOutput, ClusterOutput, ColumnOutput, PricesOutput, SeriesAnalysis};
use crate::domain::{Outcome, RiskAssessment};
use crate::extract::{DocumentDetail, DocumentReport, FieldSource};
use crate::risk::LoanCatalog;
use crate::stats::{Bin, BoxStats, BucketMode, BucketView, ClusterAssignment, Summary};

const BAR_WIDTH: usize = 40;

/// Full report for `finscan analyze`.
pub fn format_analysis(output: &AnalysisOutput) -> String {
    let mut out = String::new();

    out.push_str("=== finscan - Document Analysis ===\n");
    out.push_str(&format!("Document type: {}\n", output.class.display_name()));
    out.push_str(&format!("Documents: {}\n\n", output.documents.len()));

    out.push_str(&format_document_notes(&output.documents));

    if output.series.is_empty() {
        out.push_str("\nNo numeric data extracted from the submitted documents.\n");
        return out;
    }
    for series in &output.series {
        out.push('\n');
        out.push_str(&format_series(series));
    }
    out
}

/// One line per document saying what was taken from it.
pub fn format_document_notes(documents: &[DocumentReport]) -> String {
    let mut out = String::new();
    for doc in documents {
        out.push_str(&format!("- {}: {}\n", doc.name, document_note(doc)));
    }
    out
}

fn document_note(doc: &DocumentReport) -> String {
    match &doc.detail {
        DocumentDetail::Table {
            fields,
            source,
            nulls_dropped,
            malformed_dropped,
        } => {
            let via = match source {
                FieldSource::Designated => "",
                FieldSource::FirstNumeric => " (first numeric column)",
            };
            let mut note = format!("{} value(s) from {}{via}", doc.observations, fields.join(", "));
            if nulls_dropped + malformed_dropped > 0 {
                note.push_str(&format!(
                    "; dropped {nulls_dropped} empty and {malformed_dropped} malformed cell(s)"
                ));
            }
            note
        }
        DocumentDetail::NoNumericField => "no numeric columns found".to_string(),
        DocumentDetail::Text { tokens: 0 } => "no numeric amounts found in the text".to_string(),
        DocumentDetail::Text { tokens } => format!("{tokens} amount(s) found in the text"),
        DocumentDetail::Unsupported { extension } if extension.is_empty() => "unsupported file format".to_string(),
        DocumentDetail::Unsupported { extension } => format!(
            "'.{extension}' files need text extraction by an OCR service first; skipped"
        ),
        DocumentDetail::ReadFailed { message } => format!("could not be read: {message}"),
    }
}

/// Summary, box statistics, histogram, buckets and clusters of one series.
pub fn format_series(series: &SeriesAnalysis) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- {} (n={}) ---\n", series.label, series.count));

    out.push_str("Summary statistics:\n");
    out.push_str(&outcome_or_reason(&series.summary, format_summary));
    out.push_str("\nBox plot:\n");
    out.push_str(&outcome_or_reason(&series.box_stats, format_box_stats));
    out.push_str("\nHistogram:\n");
    out.push_str(&outcome_or_reason(&series.histogram, |bins| format_histogram(bins)));
    out.push_str("\nDistribution:\n");
    out.push_str(&outcome_or_reason(&series.buckets, format_buckets));
    out.push_str("\nClusters (k-means):\n");
    out.push_str(&outcome_or_reason(&series.clusters, format_cluster_table));
    out
}

pub fn format_column(output: &ColumnOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} : {} ===\n", output.file, output.column));
    if output.nulls > 0 {
        out.push_str(&format!("({} empty cell(s) ignored)\n", output.nulls));
    }
    out.push_str(&format_series(&output.analysis));
    out
}

pub fn format_clusters(output: &ClusterOutput) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} : {} ===\n", output.file, output.column));
    out.push_str(&outcome_or_reason(&output.assignment, |a| {
        let mut s = format_cluster_table(a);
        let unlabelled = a.labels.iter().filter(|l| l.is_none()).count();
        if unlabelled > 0 {
            s.push_str(&format!("({unlabelled} row(s) without a value left unclustered)\n"));
        }
        s
    }));
    out
}

pub fn format_summary(summary: &Summary) -> String {
    let rows = [
        ("count", summary.count as f64),
        ("mean", summary.mean),
        ("std", summary.std.unwrap_or(f64::NAN)),
        ("min", summary.min),
        ("25%", summary.q25),
        ("50%", summary.median),
        ("75%", summary.q75),
        ("max", summary.max),
    ];
    let mut out = String::new();
    for (name, value) in rows {
        let text = if name == "count" {
            summary.count.to_string()
        } else {
            fmt_num(value)
        };
        out.push_str(&format!("  {name:<6} {text:>16}\n"));
    }
    out
}

fn format_box_stats(stats: &BoxStats) -> String {
    let mut out = format!(
        "  whiskers [{}, {}] | box [{}, {}] | median {} | IQR {}\n",
        fmt_num(stats.whisker_low),
        fmt_num(stats.whisker_high),
        fmt_num(stats.q25),
        fmt_num(stats.q75),
        fmt_num(stats.median),
        fmt_num(stats.iqr),
    );
    if !stats.outliers.is_empty() {
        let shown: Vec<String> = stats.outliers.iter().take(10).map(|v| fmt_num(*v)).collect();
        let more = stats.outliers.len().saturating_sub(shown.len());
        out.push_str(&format!("  outliers: {}", shown.join(", ")));
        if more > 0 {
            out.push_str(&format!(" (+{more} more)"));
        }
        out.push('\n');
    }
    out
}

pub fn format_histogram(bins: &[Bin]) -> String {
    let max = bins.iter().map(|b| b.count).max().unwrap_or(0);
    let mut out = String::new();
    for bin in bins {
        out.push_str(
            format!(
                "  {:<24} {:>6} {}\n",
                truncate(&bin.label, 24),
                bin.count,
                bar(bin.count, max)
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_buckets(view: &BucketView) -> String {
    let mut out = String::new();
    let mode = match view.mode {
        BucketMode::Distinct => "by value",
        BucketMode::Ranged => "by range",
    };
    out.push_str(&format!("  ({mode})\n"));
    for bucket in &view.buckets {
        out.push_str(&format!(
            "  {:<24} {:>6} {:>7.1}%\n",
            truncate(&bucket.label, 24),
            bucket.count,
            bucket.percent
        ));
    }
    out
}

fn format_cluster_table(assignment: &ClusterAssignment) -> String {
    let mut out = String::new();
    out.push_str(format!("  {:<8} {:>16} {:>8}\n", "cluster", "centroid", "size").trim_end());
    out.push('\n');
    out.push_str(format!("  {:-<8} {:-<16} {:-<8}\n", "", "", "").trim_end());
    out.push('\n');
    for (id, (centroid, size)) in assignment.centroids.iter().zip(&assignment.sizes).enumerate() {
        out.push_str(&format!("  {:<8} {:>16} {:>8}\n", id, fmt_num(*centroid), size));
    }
    out.push_str(&format!(
        "  inertia {} after {} iteration(s)\n",
        fmt_num(assignment.inertia),
        assignment.iterations
    ));
    out
}

pub fn format_assessment(assessment: &RiskAssessment) -> String {
    let mut out = String::new();
    out.push_str("=== finscan - Education Loan Recommendation ===\n");
    out.push_str(&format!("Risk score: {:.2}\n", assessment.risk_score));
    out.push_str(&format!("Risk tier : {}\n\n", assessment.tier.display_name()));

    if assessment.recommended.is_empty() {
        out.push_str("Based on your inputs, no education loans are recommended.\n");
        return out;
    }
    out.push_str("Recommended education loans:\n");
    for product in &assessment.recommended {
        out.push_str(&format!("\n* {}\n", product.name));
        out.push_str(&format!("  {}\n", product.description));
        out.push_str(&format!("  Tenure: {}\n", product.tenure));
        out.push_str(&format!("  Interest rate: {}\n", product.interest_rate));
    }
    out
}

pub fn format_catalog(catalog: &LoanCatalog) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<28} {:>8} {:>8} {:>14} {:<12} {:<8}\n",
            "name", "min_acad", "min_cred", "max_income", "tenure", "rate"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<28} {:-<8} {:-<8} {:-<14} {:-<12} {:-<8}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');
    for p in catalog.products() {
        out.push_str(
            format!(
                "{:<28} {:>8.1} {:>8.0} {:>14.0} {:<12} {:<8}\n",
                truncate(&p.name, 28),
                p.min_academic_score,
                p.min_credit_score,
                p.max_annual_income,
                truncate(&p.tenure, 12),
                truncate(&p.interest_rate, 8),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_prices(output: &PricesOutput) -> String {
    let mut out = String::new();
    out.push_str("=== finscan - Price Series ===\n");
    for (name, reason) in &output.failures {
        out.push_str(&format!("- {name}: {reason}\n"));
    }

    if output.series.is_empty() {
        return out;
    }
    out.push('\n');
    out.push_str(
        format!(
            "{:<24} {:>6} {:<10} {:<10} {:>12} {:>12} {:>9} {:>12} {:>12}\n",
            "series", "n", "from", "to", "first", "last", "change", "min", "max"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<24} {:-<6} {:-<10} {:-<10} {:-<12} {:-<12} {:-<9} {:-<12} {:-<12}\n",
            "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (series, summary) in &output.series {
        let line = match summary {
            Outcome::Ready(s) => format!(
                "{:<24} {:>6} {:<10} {:<10} {:>12.2} {:>12.2} {:>9} {:>12.2} {:>12.2}\n",
                truncate(&series.name, 24),
                s.points,
                s.first_date,
                s.last_date,
                s.first_close,
                s.last_close,
                s.change_pct.map(|c| format!("{c:+.2}%")).unwrap_or_else(|| "n/a".to_string()),
                s.min_close,
                s.max_close,
            ),
            Outcome::Unavailable(reason) => format!("{:<24} {reason}\n", truncate(&series.name, 24)),
        };
        out.push_str(line.trim_end());
        out.push('\n');
        if !series.row_errors.is_empty() {
            out.push_str(&format!("  ({} row(s) skipped", series.row_errors.len()));
            if let Some(first) = series.row_errors.first() {
                out.push_str(&format!("; line {}: {}", first.line, first.message));
            }
            out.push_str(")\n");
        }
    }
    out
}

fn outcome_or_reason<T>(outcome: &Outcome<T>, render: impl Fn(&T) -> String) -> String {
    match outcome {
        Outcome::Ready(value) => render(value),
        Outcome::Unavailable(reason) => format!("  {reason}\n"),
    }
}

fn fmt_num(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.abs() >= 1e9 {
        format!("{v:.4e}")
    } else {
        format!("{v:.4}")
    }
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (count * BAR_WIDTH).div_ceil(max);
    "#".repeat(len)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
