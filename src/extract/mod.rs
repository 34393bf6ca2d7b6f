//! Document value extraction.
//!
//! - amount tokens from OCR text (`tokens`)
//! - primary-field resolution for tables (`tabular`)
//! - merging both into canonical observation sets (`builder`)

pub mod builder;
pub mod tabular;
pub mod tokens;

pub use builder::*;
pub use tabular::*;
pub use tokens::*;
