// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::ConfigError;
use crate::regression::Polarity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for regression detection.
///
/// Every field has a default, so a partial configuration file or a handful
/// of environment overrides deserialize into a complete value.
///
/// # Example
/// ```
/// use benchwatch_core::regression::DetectorConfig;
///
/// let config = DetectorConfig::default();
/// assert_eq!(config.window_size, 5);
/// assert_eq!(config.threshold_ratio, 1.5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of most recent prior values averaged into the baseline.
    pub window_size: usize,

    /// How many times worse than the baseline a value must be to be flagged.
    ///
    /// 1.5 means 50% worse. The comparison is strict: a value exactly at the
    /// threshold is not a regression.
    pub threshold_ratio: f64,

    /// Minimum number of prior values needed before a benchmark is judged.
    pub min_samples: usize,

    /// Alerts with a ratio above this fail the CI step; `None` makes every
    /// alert a failure.
    pub fail_ratio: Option<f64>,

    /// Explicit polarity per benchmark name.
    pub polarity_overrides: BTreeMap<String, Polarity>,

    /// Explicit polarity per unit label, for units inference does not know.
    pub unit_polarity: BTreeMap<String, Polarity>,

    /// Fallback polarity per tool when the unit gives no answer.
    pub tool_polarity: BTreeMap<String, Polarity>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let tool_polarity = BTreeMap::from([
            ("customBiggerIsBetter".to_string(), Polarity::HigherIsBetter),
            ("customSmallerIsBetter".to_string(), Polarity::LowerIsBetter),
        ]);

        Self {
            window_size: 5,
            threshold_ratio: 1.5,
            min_samples: 2,
            fail_ratio: None,
            polarity_overrides: BTreeMap::new(),
            unit_polarity: BTreeMap::new(),
            tool_polarity,
        }
    }
}

impl DetectorConfig {
    /// Tighter threshold over a longer window.
    pub fn strict() -> Self {
        Self {
            window_size: 10,
            threshold_ratio: 1.2,
            min_samples: 3,
            ..Self::default()
        }
    }

    /// Only flag large slowdowns; judge benchmarks from their first prior value.
    pub fn permissive() -> Self {
        Self {
            window_size: 3,
            threshold_ratio: 2.0,
            min_samples: 1,
            ..Self::default()
        }
    }

    /// Reject out-of-range settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError("window_size must be at least 1".to_string()));
        }

        if self.min_samples == 0 {
            return Err(ConfigError("min_samples must be at least 1".to_string()));
        }

        if self.min_samples > self.window_size {
            return Err(ConfigError(format!(
                "min_samples ({}) cannot exceed window_size ({})",
                self.min_samples, self.window_size
            )));
        }

        if !self.threshold_ratio.is_finite() || self.threshold_ratio < 1.0 {
            return Err(ConfigError(format!(
                "threshold_ratio must be a finite number >= 1.0, got {}",
                self.threshold_ratio
            )));
        }

        if let Some(fail_ratio) = self.fail_ratio {
            if !fail_ratio.is_finite() {
                return Err(ConfigError(format!(
                    "fail_ratio must be finite, got {fail_ratio}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.window_size, 5);
        assert_eq!(config.threshold_ratio, 1.5);
        assert_eq!(config.min_samples, 2);
        assert!(config.fail_ratio.is_none());
        assert_eq!(
            config.tool_polarity.get("customSmallerIsBetter"),
            Some(&Polarity::LowerIsBetter)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(DetectorConfig::strict().validate().is_ok());
        assert!(DetectorConfig::permissive().validate().is_ok());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_window() {
        let mut config = DetectorConfig::default();
        config.window_size = 0;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.min_samples = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_thresholds() {
        let mut config = DetectorConfig::default();
        config.threshold_ratio = 0.9;
        assert!(config.validate().is_err());

        config.threshold_ratio = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.fail_ratio = Some(f64::INFINITY);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{"threshold_ratio": 2.0, "unit_polarity": {"score": "higher"}}"#)
                .unwrap();
        assert_eq!(config.threshold_ratio, 2.0);
        assert_eq!(config.window_size, 5);
        assert_eq!(
            config.unit_polarity.get("score"),
            Some(&Polarity::HigherIsBetter)
        );
    }
}
