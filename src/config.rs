//! Process settings from the environment (and `.env`, if present).
//!
//! | variable          | meaning                                  | default |
//! |-------------------|------------------------------------------|---------|
//! | `FINSCAN_LOG`     | `tracing` filter directive               | `warn`  |
//! | `FINSCAN_CATALOG` | path to a JSON loan catalog              | built-in catalog |
//!
//! CLI flags take precedence over both.

use std::path::PathBuf;

pub const LOG_ENV: &str = "FINSCAN_LOG";
pub const CATALOG_ENV: &str = "FINSCAN_CATALOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_filter: String,
    pub catalog_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            catalog_path: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            log_filter: get(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            catalog_path: get(CATALOG_ENV).map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(Settings::from_lookup(lookup(&[])), Settings::default());
    }

    #[test]
    fn reads_both_variables() {
        let settings = Settings::from_lookup(lookup(&[
            (LOG_ENV, "finscan=debug"),
            (CATALOG_ENV, "/etc/finscan/loans.json"),
        ]));
        assert_eq!(settings.log_filter, "finscan=debug");
        assert_eq!(settings.catalog_path, Some(PathBuf::from("/etc/finscan/loans.json")));
    }

    #[test]
    fn blank_values_are_ignored() {
        let settings = Settings::from_lookup(lookup(&[(LOG_ENV, "  "), (CATALOG_ENV, "")]));
        assert_eq!(settings, Settings::default());
    }
}
