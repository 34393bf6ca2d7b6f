//! Applicant risk scoring and loan recommendation.

pub mod catalog;
pub mod scoring;

pub use catalog::*;
pub use scoring::*;
