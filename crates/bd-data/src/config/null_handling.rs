//! Missing value detection for ingested CSV cells

use serde::{Serialize, Deserialize};

/// Placeholder stored in place of a missing cell
pub const MISSING_PLACEHOLDER: &str = "no_value";

/// Missing value configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullConfig {
    /// Patterns to treat as missing
    pub patterns: Vec<String>,

    /// Whether to trim whitespace before checking
    pub trim_whitespace: bool,

    /// Case sensitive matching
    pub case_sensitive: bool,
}

/// Default missing-value markers of pandas `read_csv`, matched literally
const PANDAS_NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: PANDAS_NA_VALUES.iter().map(|p| p.to_string()).collect(),
            // Whitespace-only cells count as blank
            trim_whitespace: true,
            case_sensitive: true,
        }
    }
}

impl NullConfig {
    /// Check if a value should be treated as missing
    pub fn is_null(&self, value: &str) -> bool {
        let test_value = if self.trim_whitespace {
            value.trim()
        } else {
            value
        };

        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                test_value == pattern
            } else {
                test_value.eq_ignore_ascii_case(pattern)
            }
        })
    }

    /// Add a missing value pattern
    pub fn add_pattern(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cells_are_missing() {
        let config = NullConfig::default();
        assert!(config.is_null(""));
        assert!(config.is_null("   "));
        assert!(config.is_null("n/a"));
        assert!(config.is_null("#N/A"));
        assert!(!config.is_null("north"));
    }

    #[test]
    fn test_default_markers_match_literally() {
        let config = NullConfig::default();
        assert!(config.is_null("NA"));
        assert!(config.is_null("None"));
        assert!(!config.is_null("na"));
        assert!(!config.is_null("Na"));
        assert!(!config.is_null("NONE"));
        assert!(!config.is_null("Null"));
    }

    #[test]
    fn test_case_sensitive_patterns() {
        let mut config = NullConfig {
            patterns: Vec::new(),
            trim_whitespace: false,
            case_sensitive: true,
        };
        config.add_pattern("NULL".to_string());
        config.add_pattern("NULL".to_string());

        assert_eq!(config.patterns.len(), 1);
        assert!(config.is_null("NULL"));
        assert!(!config.is_null("null"));
        assert!(!config.is_null(" NULL"));
    }
}
