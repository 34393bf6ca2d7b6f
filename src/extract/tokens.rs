//! Currency-like number extraction from free-form text.
//!
//! OCR output is noisy, so we only trust the narrow "digits, point, two
//! digits" shape (`1234.50`). Anything else in the text is ignored; there is
//! no failure mode.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// ASCII digits only: every match must parse as `f64`.
static AMOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+\.[0-9]{2}").expect("amount pattern is valid"));

/// A matched token: the exact substring plus its parsed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericToken {
    pub text: String,
    pub value: f64,
}

/// Lazily iterate the amount tokens in `text`, left to right.
pub fn iter_tokens(text: &str) -> impl Iterator<Item = NumericToken> + '_ {
    AMOUNT_PATTERN.find_iter(text).filter_map(|m| {
        let value = m.as_str().parse::<f64>().ok()?;
        Some(NumericToken {
            text: m.as_str().to_string(),
            value,
        })
    })
}

/// Extract every amount token in `text`, in order of appearance.
pub fn extract_tokens(text: &str) -> Vec<NumericToken> {
    iter_tokens(text).collect()
}

/// Convenience: just the values.
pub fn extract_amounts(text: &str) -> Vec<f64> {
    iter_tokens(text).map(|t| t.value).collect()
}
