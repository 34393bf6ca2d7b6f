//! Top-level application orchestration.
//!
//! `src/main.rs` only maps the result to an exit code; this module:
//! - loads settings and initialises logging
//! - parses CLI arguments
//! - runs the matching pipeline
//! - prints reports and writes optional exports

use std::borrow::Cow;
use std::path::Path;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, CatalogArgs, Cli, ClusterArgs, ColumnArgs, Command, PricesArgs, ScoreArgs};
use crate::config::{DEFAULT_LOG_FILTER, Settings};
use crate::domain::{AnalysisConfig, ApplicantProfile, Outcome, PriorLoan};
use crate::error::AppError;
use crate::risk::{LoanCatalog, assess, validate_profile};

pub mod pipeline;

/// Entry point for the `finscan` binary.
pub fn run() -> Result<(), AppError> {
    let settings = Settings::from_env();
    init_tracing(&settings);

    let cli = Cli::parse();
    debug!(command = ?cli.command, "dispatching");

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Column(args) => handle_column(args),
        Command::Cluster(args) => handle_cluster(args),
        Command::Score(args) => handle_score(args, &settings),
        Command::Catalog(args) => handle_catalog(args, &settings),
        Command::Prices(args) => handle_prices(args),
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Ignore an already-installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(args);
    let output = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_analysis(&output));

    if let Some(path) = &config.export_json {
        crate::io::export::write_json(path, &output)?;
    }
    if !output.has_data() {
        return Err(AppError::no_data("No numeric data found in the submitted documents."));
    }
    Ok(())
}

pub fn analysis_config_from_args(args: AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        class: args.class,
        files: args.files,
        histogram_bins: args.bins,
        export_json: args.json,
    }
}

fn handle_column(args: ColumnArgs) -> Result<(), AppError> {
    let output = pipeline::run_column(&args.csv, args.column.as_deref())?;
    println!("{}", crate::report::format_column(&output));
    Ok(())
}

fn handle_cluster(args: ClusterArgs) -> Result<(), AppError> {
    let output = pipeline::run_cluster(&args.csv, args.column.as_deref())?;
    println!("{}", crate::report::format_clusters(&output));

    if let Some(path) = &args.export {
        match &output.assignment {
            Outcome::Ready(assignment) => {
                crate::io::export::write_clusters_csv(path, &output.records, &assignment.labels)?;
            }
            Outcome::Unavailable(reason) => {
                return Err(AppError::no_data(format!("Nothing to export: {reason}.")));
            }
        }
    }
    Ok(())
}

fn handle_score(args: ScoreArgs, settings: &Settings) -> Result<(), AppError> {
    let profile = profile_from_args(&args);
    validate_profile(&profile)?;

    let catalog = load_catalog(&args.catalog, settings)?;
    let assessment = assess(&profile, &catalog);
    println!("{}", crate::report::format_assessment(&assessment));
    Ok(())
}

pub fn profile_from_args(args: &ScoreArgs) -> ApplicantProfile {
    ApplicantProfile {
        academic_score: args.academic,
        credit_score: args.credit,
        annual_income: args.income,
        marks_12: args.marks_12,
        ug_marks: args.ug,
        prior_loan: args.past_loan.map(|amount| PriorLoan {
            amount,
            emi_bounces: args.emi_bounces.unwrap_or(0),
        }),
    }
}

fn handle_catalog(args: CatalogArgs, settings: &Settings) -> Result<(), AppError> {
    let catalog = load_catalog(&args, settings)?;
    println!("{}", crate::report::format_catalog(&catalog));
    Ok(())
}

/// The `--catalog` flag, then `FINSCAN_CATALOG`, then the built-in catalog.
fn load_catalog(args: &CatalogArgs, settings: &Settings) -> Result<Cow<'static, LoanCatalog>, AppError> {
    let path: Option<&Path> = args.catalog.as_deref().or(settings.catalog_path.as_deref());
    match path {
        Some(path) => {
            let catalog = LoanCatalog::from_json_file(path)?;
            if catalog.products().is_empty() {
                warn!(path = %path.display(), "loan catalog is empty");
            }
            Ok(Cow::Owned(catalog))
        }
        None => Ok(Cow::Borrowed(LoanCatalog::builtin())),
    }
}

fn handle_prices(args: PricesArgs) -> Result<(), AppError> {
    let output = pipeline::run_prices(&args.files)?;
    println!("{}", crate::report::format_prices(&output));
    if output.series.is_empty() {
        return Err(AppError::no_data("No usable price series."));
    }
    Ok(())
}
