// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::commit::CommitEntry;
use crate::error::{ConfigError, PolarityError};
use crate::record::BenchmarkRecord;
use crate::regression::{DetectorConfig, Polarity};
use crate::store::HistoryStore;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// One benchmark that got worse than its baseline by more than the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionAlert {
    /// Name of the regressed benchmark.
    pub benchmark_name: String,
    /// Unit of `baseline` and `new_value`.
    pub unit: String,
    /// Mean of the prior window.
    pub baseline: f64,
    /// Value in the new entry.
    pub new_value: f64,
    /// How many times worse than the baseline, always above the threshold.
    pub ratio: f64,
    /// Polarity the ratio was computed with.
    pub direction: Polarity,
    /// Number of prior values in the baseline window.
    pub samples: usize,
}

impl RegressionAlert {
    /// Whether this alert should fail the CI step under `config`.
    pub fn is_failure(&self, config: &DetectorConfig) -> bool {
        config.fail_ratio.map_or(true, |limit| self.ratio > limit)
    }

    /// Signed relative change of the value, in percent.
    pub fn change_percent(&self) -> f64 {
        if self.baseline == 0.0 {
            return 0.0;
        }
        (self.new_value - self.baseline) / self.baseline * 100.0
    }
}

impl fmt::Display for RegressionAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} vs baseline {:.4} {} ({:.2}x worse, {}, n={})",
            self.benchmark_name,
            self.new_value,
            self.unit,
            self.baseline,
            self.unit,
            self.ratio,
            self.direction,
            self.samples
        )
    }
}

/// Why a benchmark was left out of the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No prior commit ran this benchmark.
    NoHistory,
    /// Fewer prior values than `min_samples`.
    InsufficientSamples {
        /// Prior values available.
        have: usize,
        /// Prior values required.
        need: usize,
    },
    /// The unit's polarity could not be determined.
    UnknownPolarity {
        /// The unclassifiable unit.
        unit: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoHistory => write!(f, "no history"),
            SkipReason::InsufficientSamples { have, need } => {
                write!(f, "{have} of {need} required samples")
            }
            SkipReason::UnknownPolarity { unit } => write!(f, "unknown polarity for unit '{unit}'"),
        }
    }
}

/// A benchmark excluded from detection, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBenchmark {
    /// Benchmark name.
    pub name: String,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Full outcome of a detection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionReport {
    /// Regressions found, in the entry's benchmark order.
    pub alerts: Vec<RegressionAlert>,
    /// Benchmarks that could not be judged.
    pub skipped: Vec<SkippedBenchmark>,
}

impl DetectionReport {
    /// Whether any regression was found.
    pub fn has_regressions(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Alerts that fail the CI step under `config`.
    pub fn failures<'a>(
        &'a self,
        config: &'a DetectorConfig,
    ) -> impl Iterator<Item = &'a RegressionAlert> + 'a {
        self.alerts.iter().filter(move |alert| alert.is_failure(config))
    }
}

/// Detector bound to a validated configuration.
#[derive(Debug, Clone, Default)]
pub struct RegressionDetector {
    config: DetectorConfig,
}

impl RegressionDetector {
    /// Create a detector, rejecting an invalid configuration.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// See [`detect`].
    pub fn detect(
        &self,
        store: &HistoryStore,
        tool: &str,
        new_entry: &CommitEntry,
    ) -> Vec<RegressionAlert> {
        detect(store, tool, new_entry, &self.config)
    }

    /// See [`analyze`].
    pub fn analyze(
        &self,
        store: &HistoryStore,
        tool: &str,
        new_entry: &CommitEntry,
    ) -> DetectionReport {
        analyze(store, tool, new_entry, &self.config)
    }
}

/// Regressions of `new_entry` relative to the history of `tool`.
pub fn detect(
    store: &HistoryStore,
    tool: &str,
    new_entry: &CommitEntry,
    config: &DetectorConfig,
) -> Vec<RegressionAlert> {
    analyze(store, tool, new_entry, config).alerts
}

/// Compare every record of `new_entry` against its baseline window.
///
/// Only commits recorded before `new_entry` contribute to the baseline, so
/// the result is the same whether or not `new_entry` was already appended.
///
/// `config` should pass [`DetectorConfig::validate`]; [`RegressionDetector`]
/// guarantees that. An invalid configuration is logged, and a benchmark is
/// never judged against an empty window.
pub fn analyze(
    store: &HistoryStore,
    tool: &str,
    new_entry: &CommitEntry,
    config: &DetectorConfig,
) -> DetectionReport {
    if let Err(err) = config.validate() {
        warn!(error = %err, "Running regression detection with an invalid configuration");
    }
    let mut report = DetectionReport::default();

    for record in new_entry.benches() {
        match judge(store, tool, new_entry, record, config) {
            Ok(Some(alert)) => {
                debug!(benchmark = record.name(), ratio = alert.ratio, "Regression flagged");
                report.alerts.push(alert);
            }
            Ok(None) => {}
            Err(reason) => {
                if let SkipReason::UnknownPolarity { unit } = &reason {
                    warn!(
                        benchmark = record.name(),
                        unit = %unit,
                        "Skipping benchmark with unknown polarity"
                    );
                }
                report.skipped.push(SkippedBenchmark {
                    name: record.name().to_string(),
                    reason,
                });
            }
        }
    }

    info!(
        tool,
        commit = %new_entry.commit().short_id(),
        benches = new_entry.benches().len(),
        alerts = report.alerts.len(),
        skipped = report.skipped.len(),
        "Regression detection complete"
    );
    report
}

fn judge(
    store: &HistoryStore,
    tool: &str,
    new_entry: &CommitEntry,
    record: &BenchmarkRecord,
    config: &DetectorConfig,
) -> Result<Option<RegressionAlert>, SkipReason> {
    let prior: Vec<f64> = store
        .series_before(tool, record.name(), &new_entry.commit().id)
        .map(|(_, value)| value)
        .collect();
    if prior.is_empty() {
        return Err(SkipReason::NoHistory);
    }

    let window = &prior[prior.len().saturating_sub(config.window_size)..];
    let need = config.min_samples.max(1);
    if window.len() < need {
        return Err(SkipReason::InsufficientSamples {
            have: window.len(),
            need,
        });
    }

    let direction = Polarity::resolve(config, tool, record).map_err(
        |PolarityError::UnknownPolarity { unit }| SkipReason::UnknownPolarity { unit },
    )?;

    let baseline = window.iter().sum::<f64>() / window.len() as f64;
    let ratio = direction.ratio(baseline, record.value());

    if ratio > config.threshold_ratio {
        Ok(Some(RegressionAlert {
            benchmark_name: record.name().to_string(),
            unit: record.unit().to_string(),
            baseline,
            new_value: record.value(),
            ratio,
            direction,
            samples: window.len(),
        }))
    } else {
        Ok(None)
    }
}
