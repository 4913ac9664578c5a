//! Alignment configuration.
//!
//! Deserializes from the formatter's configuration file, e.g.:
//!
//! ```jsonc
//! {
//!   "alignment": {
//!     "enabled": true,
//!     "columnLimit": 100
//!   }
//! }
//! ```
//!
//! Missing fields fall back to their defaults, so a partial object is
//! always valid.

use serde::{Deserialize, Serialize};

/// Knobs for the tabular alignment pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlignmentConfig {
    /// Master switch; when off, the pass leaves all spacing untouched.
    pub enabled: bool,
    /// Maximum visual width a fully aligned line may occupy. Groups whose
    /// aligned width would exceed this are left unaligned.
    pub column_limit: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            column_limit: 100,
        }
    }
}

impl AlignmentConfig {
    /// Convenience constructor for a given column limit.
    pub fn with_column_limit(column_limit: usize) -> Self {
        Self {
            column_limit,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AlignmentConfig::default();
        assert!(config.enabled);
        assert_eq!(config.column_limit, 100);
    }

    #[test]
    fn deserializes_partial_object() {
        let config: AlignmentConfig = serde_json::from_str(r#"{"columnLimit": 80}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.column_limit, 80);
    }

    #[test]
    fn round_trips_through_json() {
        let config = AlignmentConfig {
            enabled: false,
            column_limit: 120,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"enabled":false,"columnLimit":120}"#);
        let back: AlignmentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
