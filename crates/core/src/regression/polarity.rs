// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::PolarityError;
use crate::record::BenchmarkRecord;
use crate::regression::DetectorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const TIME_UNITS: &[&str] = &[
    "ps", "ns", "nsec", "nanosecond", "nanoseconds", "us", "usec", "microsecond", "microseconds",
    "ms", "msec", "millisecond", "milliseconds", "s", "sec", "secs", "second", "seconds", "min",
    "mins", "minute", "minutes",
];

const SIZE_UNITS: &[&str] = &[
    "b", "byte", "bytes", "kb", "kib", "mb", "mib", "gb", "gib", "alloc", "allocs", "allocation",
    "allocations",
];

const RATE_UNITS: &[&str] = &[
    "hz", "khz", "mhz", "ghz", "ops", "ips", "rps", "qps", "tps", "fps", "throughput",
];

/// Which direction of change is an improvement for a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Throughput-like: larger values are better.
    #[serde(alias = "higher", alias = "bigger")]
    HigherIsBetter,
    /// Latency- or size-like: smaller values are better.
    #[serde(alias = "lower", alias = "smaller")]
    LowerIsBetter,
}

impl Polarity {
    /// Infer polarity from a unit label.
    ///
    /// Rates (`iter/sec`, `MB/s`, `ops`, `Hz`) are higher-is-better;
    /// durations and sizes (`ns`, `usec`, `ns/iter`, `B/op`) are
    /// lower-is-better.
    ///
    /// # Errors
    ///
    /// [`PolarityError::UnknownPolarity`] if the unit matches no rule.
    pub fn infer(unit: &str) -> Result<Self, PolarityError> {
        let normalized = unit
            .trim()
            .to_lowercase()
            .replace(['µ', 'μ'], "u")
            .replace(" per ", "/");
        let normalized: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();

        let polarity = match normalized.split_once('/') {
            Some((_, per)) if is_time(per) => Some(Polarity::HigherIsBetter),
            Some((what, _)) if is_time(what) || is_size(what) => Some(Polarity::LowerIsBetter),
            Some(_) => None,
            None if is_time(&normalized) || is_size(&normalized) => Some(Polarity::LowerIsBetter),
            None if RATE_UNITS.contains(&normalized.as_str()) => Some(Polarity::HigherIsBetter),
            None => None,
        };

        polarity.ok_or_else(|| PolarityError::UnknownPolarity {
            unit: unit.to_string(),
        })
    }

    /// Resolve the polarity of a record of `tool`.
    ///
    /// Precedence: per-benchmark override, per-unit override, inference from
    /// the unit, then the tool's convention. Override keys match exactly, or
    /// ignoring ASCII case when there is no exact key.
    pub fn resolve(
        config: &DetectorConfig,
        tool: &str,
        record: &BenchmarkRecord,
    ) -> Result<Self, PolarityError> {
        if let Some(polarity) = lookup(&config.polarity_overrides, record.name()) {
            return Ok(polarity);
        }
        if let Some(polarity) = lookup(&config.unit_polarity, record.unit()) {
            return Ok(polarity);
        }
        Self::infer(record.unit()).or_else(|err| lookup(&config.tool_polarity, tool).ok_or(err))
    }

    /// How many times worse `value` is than `baseline`.
    ///
    /// Values above 1.0 are unfavorable, below 1.0 favorable. A zero
    /// denominator yields infinity when the numerator is positive and 1.0
    /// when both are zero.
    pub fn ratio(self, baseline: f64, value: f64) -> f64 {
        let (worse, better) = match self {
            Polarity::HigherIsBetter => (baseline, value),
            Polarity::LowerIsBetter => (value, baseline),
        };
        if better == 0.0 {
            if worse > 0.0 {
                f64::INFINITY
            } else {
                1.0
            }
        } else {
            worse / better
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::HigherIsBetter => write!(f, "higher is better"),
            Polarity::LowerIsBetter => write!(f, "lower is better"),
        }
    }
}

fn is_time(unit: &str) -> bool {
    TIME_UNITS.contains(&unit)
}

fn is_size(unit: &str) -> bool {
    SIZE_UNITS.contains(&unit)
}

fn lookup(map: &BTreeMap<String, Polarity>, key: &str) -> Option<Polarity> {
    map.get(key).copied().or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, polarity)| *polarity)
    })
}
