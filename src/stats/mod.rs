//! Aggregation, binning and clustering over numeric columns.

pub mod binning;
pub mod kmeans;
pub mod summary;

pub use binning::*;
pub use kmeans::*;
pub use summary::*;
