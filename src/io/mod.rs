//! Input/output helpers.
//!
//! - CSV ingest into typed record sets (`ingest`)
//! - document loading by file extension (`documents`)
//! - JSON/CSV exports (`export`)

pub mod documents;
pub mod export;
pub mod ingest;

pub use documents::*;
pub use export::*;
pub use ingest::*;
