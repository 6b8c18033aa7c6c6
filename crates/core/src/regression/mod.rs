// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Regression detection against a rolling per-benchmark baseline.
//!
//! For every record of a new entry the detector takes the most recent prior
//! values of the same benchmark, averages them into a baseline and compares
//! the new value in the benchmark's unfavorable direction. A regression is
//! flagged only when the ratio strictly exceeds the configured threshold.
//!
//! Benchmarks without history, with too few samples, or whose unit has no
//! known polarity are skipped and reported, never flagged.

mod config;
mod detector;
mod polarity;

pub use config::DetectorConfig;
pub use detector::{
    analyze, detect, DetectionReport, RegressionAlert, RegressionDetector, SkipReason,
    SkippedBenchmark,
};
pub use polarity::Polarity;
