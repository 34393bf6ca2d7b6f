//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - document inputs (`DocumentClass`, `RecordSet`, `Document`)
//! - normalized observations (`Observation`, `ObservationSet`)
//! - the `Outcome` wrapper for results that may lack data
//! - applicant and loan types for the recommendation flow

pub mod types;

pub use types::*;
