//! Command-line parsing for finscan.
//!
//! Parsing only; dispatch lives in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::DocumentClass;
use crate::stats::DEFAULT_HISTOGRAM_BINS;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "finscan",
    version,
    about = "Financial document analysis and education-loan recommendation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract amounts from several documents of one type and analyse them together.
    ///
    /// CSV files are read by column; `.txt` files are treated as OCR output and
    /// scanned for amounts. Images, PDFs and Word files are listed as skipped.
    Analyze(AnalyzeArgs),
    /// Summarise one numeric column of a CSV.
    Column(ColumnArgs),
    /// Split one numeric column of a CSV into three k-means clusters.
    Cluster(ClusterArgs),
    /// Score an applicant and recommend education loans.
    Score(ScoreArgs),
    /// Print the loan catalog in effect.
    Catalog(CatalogArgs),
    /// Summarise Date/Close price series.
    Prices(PricesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Type of the submitted documents.
    #[arg(short = 'c', long, value_enum)]
    pub class: DocumentClass,

    /// Number of histogram bins.
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,

    /// Write the full analysis as JSON.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Documents to analyse.
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ColumnArgs {
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Column to summarise (defaults to the first numeric column).
    #[arg(long)]
    pub column: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ClusterArgs {
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Column to cluster (defaults to the first numeric column).
    #[arg(long)]
    pub column: Option<String>,

    /// Write the table with an added `Cluster` column.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    /// Academic score (0-100).
    #[arg(long)]
    pub academic: f64,

    /// Credit score (300-850).
    #[arg(long)]
    pub credit: f64,

    /// Annual income.
    #[arg(long)]
    pub income: f64,

    /// 12th standard marks (0-100).
    #[arg(long = "marks-12")]
    pub marks_12: f64,

    /// Undergraduate marks (0-100), for applicants who completed a degree.
    #[arg(long)]
    pub ug: Option<f64>,

    /// Amount of a previous loan.
    #[arg(long = "past-loan", requires = "emi_bounces")]
    pub past_loan: Option<f64>,

    /// EMI bounces on the previous loan.
    #[arg(long = "emi-bounces", requires = "past_loan")]
    pub emi_bounces: Option<u32>,

    #[command(flatten)]
    pub catalog: CatalogArgs,
}

#[derive(Debug, Args, Clone, Default)]
pub struct CatalogArgs {
    /// JSON loan catalog to use instead of the built-in one (overrides FINSCAN_CATALOG).
    #[arg(long, value_name = "JSON")]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PricesArgs {
    /// CSV files with `Date` and `Close` columns.
    #[arg(required = true, value_name = "CSV")]
    pub files: Vec<PathBuf>,
}
