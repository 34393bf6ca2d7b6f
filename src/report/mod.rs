//! Terminal reports for every command.

pub mod format;

pub use format::*;
