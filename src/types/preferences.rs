//! User preferences that feed calibration
//!
//! Loaded read-only from a JSON file; any missing key takes its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::ConfigError;

/// Calibration preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Constant offset added to every raw bearing (degrees)
    pub crosshair_correction: f64,
    /// Tall resolution aiming: manual corrections step by one vertical pixel
    pub use_tall_res: bool,
    /// Viewport height in pixels when `use_tall_res` is on
    pub resolution_height: u32,
    /// Standard deviation of a normal throw (degrees)
    pub sigma: f64,
    /// Standard deviation of a throw on the alternative profile (degrees)
    pub sigma_alt: f64,
    /// Standard deviation of a manually entered throw (degrees)
    pub sigma_manual: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            crosshair_correction: 0.0,
            use_tall_res: false,
            resolution_height: 16384,
            sigma: 0.1,
            sigma_alt: 0.1,
            sigma_manual: 0.03,
        }
    }
}

impl Preferences {
    /// Read and validate preferences from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate preferences from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let preferences: Preferences = serde_json::from_str(json)?;
        preferences.validate()?;
        Ok(preferences)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.crosshair_correction.is_finite() {
            return Err(ConfigError::Invalid {
                field: "crosshair_correction",
                message: "must be finite".to_string(),
            });
        }
        if self.resolution_height == 0 {
            return Err(ConfigError::Invalid {
                field: "resolution_height",
                message: "must be positive".to_string(),
            });
        }
        for (field, sigma) in [
            ("sigma", self.sigma),
            ("sigma_alt", self.sigma_alt),
            ("sigma_manual", self.sigma_manual),
        ] {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be a positive number, got {}", sigma),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_keys_take_defaults() {
        let preferences = Preferences::from_json(r#"{"use_tall_res": true}"#).unwrap();
        assert_eq!(
            preferences,
            Preferences {
                use_tall_res: true,
                ..Preferences::default()
            }
        );
    }

    #[test]
    fn test_rejects_zero_resolution() {
        let err = Preferences::from_json(r#"{"resolution_height": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "resolution_height",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_non_positive_sigma() {
        let err = Preferences::from_json(r#"{"sigma_alt": -0.5}"#).unwrap_err();
        assert!(err.to_string().contains("sigma_alt"));
    }

    #[test]
    fn test_malformed_json() {
        let err = Preferences::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Preferences::load("/nonexistent/eyecalc/preferences.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
