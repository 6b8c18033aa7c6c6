// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark records: one measured scenario within a commit entry.
//!
//! Records only exist in validated form. Untrusted input arrives as a
//! [`RawBenchmark`] and becomes a [`BenchmarkRecord`] through
//! [`BenchmarkRecord::validate`].

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

/// First decimal number in a free-text range annotation.
static RANGE_MAGNITUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]+(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?|\.[0-9]+(?:[eE][-+]?[0-9]+)?")
        .expect("range pattern is valid")
});

/// Unvalidated benchmark record as it appears on the wire.
///
/// Every field is optional here so that absence can be reported precisely
/// instead of as a generic deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawBenchmark {
    /// Scenario name.
    #[serde(default)]
    pub name: Option<String>,
    /// Measured value; kept untyped so non-numeric input maps to `InvalidValue`.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Unit label.
    #[serde(default)]
    pub unit: Option<String>,
    /// Uncertainty annotation.
    #[serde(default)]
    pub range: Option<String>,
    /// Auxiliary detail.
    #[serde(default)]
    pub extra: Option<String>,
}

/// A validated measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    name: String,
    #[serde(serialize_with = "serialize_value")]
    value: f64,
    unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra: Option<String>,
}

impl BenchmarkRecord {
    /// Validate a raw record.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingField`] if `name`, `value` or `unit` is absent,
    ///   or `name` is empty.
    /// - [`ValidationError::InvalidValue`] if `value` is not a finite,
    ///   non-negative number.
    pub fn validate(raw: RawBenchmark) -> Result<Self, ValidationError> {
        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(ValidationError::MissingField("name"))?;
        let value = raw.value.ok_or(ValidationError::MissingField("value"))?;
        let unit = raw.unit.ok_or(ValidationError::MissingField("unit"))?;

        let value = match value.as_f64() {
            Some(v) => check_value(&name, v)?,
            None => {
                return Err(ValidationError::InvalidValue {
                    name,
                    value: value.to_string(),
                })
            }
        };

        Ok(Self {
            name,
            value,
            unit,
            range: raw.range,
            extra: raw.extra,
        })
    }

    /// Build a record from typed parts.
    pub fn new(
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        let value = check_value(&name, value)?;
        Ok(Self {
            name,
            value,
            unit: unit.into(),
            range: None,
            extra: None,
        })
    }

    /// Attach a range annotation.
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    /// Attach auxiliary detail.
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Scenario name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary measured value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Unit label for [`value`](Self::value).
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Free-text uncertainty annotation, if any.
    pub fn range(&self) -> Option<&str> {
        self.range.as_deref()
    }

    /// Auxiliary detail, if any.
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }

    /// Leading numeric magnitude of the range annotation.
    ///
    /// Understands the common harness formats such as `"± 1,234"`,
    /// `"stddev: 0.000123"` and `"+/- 5.2%"`. Thousands separators are
    /// ignored. Returns `None` when there is no range or no number in it.
    pub fn spread(&self) -> Option<f64> {
        let range = self.range.as_deref()?.replace(',', "");
        RANGE_MAGNITUDE
            .find(&range)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

fn check_value(name: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Integral values are written without a fractional part, as the JavaScript
/// writer of the artifact does.
fn serialize_value<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
