//! `finscan` library crate.
//!
//! Numeric extraction and analysis for financial documents, plus a
//! rule-based education-loan recommender. The `finscan` binary is a thin
//! wrapper around `app::run`.
//!
//! Data flow: documents (`io`) -> observations (`extract`) -> statistics
//! (`stats`) -> reports (`report`). Risk scoring (`risk`) and price series
//! (`market`) stand on their own.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod io;
pub mod market;
pub mod report;
pub mod risk;
pub mod stats;
