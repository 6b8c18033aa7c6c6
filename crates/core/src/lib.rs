// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark history ledger and regression detection.
//!
//! This crate owns the data behind a continuous-benchmarking dashboard: an
//! append-only ledger of benchmark runs keyed by commit, the rules that
//! validate it, and the detector that flags regressions in a new run.
//!
//! # Quick Start
//!
//! ```
//! use benchwatch_core::{
//!     regression, BenchmarkRecord, CommitEntry, CommitInfo, HistoryStore, Person,
//! };
//!
//! let mut store = HistoryStore::new("https://github.com/example/project");
//!
//! let commit = CommitInfo {
//!     author: Person::new("Ada", "ada@example.com", "ada"),
//!     committer: Person::new("Ada", "ada@example.com", "ada"),
//!     distinct: Some(true),
//!     id: "0123456789abcdef0123456789abcdef01234567".to_string(),
//!     message: "Add parser benchmarks".to_string(),
//!     timestamp: "2024-03-01T12:00:00Z".to_string(),
//!     tree_id: None,
//!     url: "https://github.com/example/project/commit/0123456".to_string(),
//! };
//! let records = vec![BenchmarkRecord::new("parse_small", 120000.0, "iter/sec")?];
//! let entry = CommitEntry::create(commit, 1_709_294_400_000, "pytest", records)?;
//!
//! let alerts = regression::detect(&store, "pytest", &entry, &Default::default());
//! assert!(alerts.is_empty()); // first observation only sets the baseline
//!
//! store.append("pytest", entry)?;
//! let artifact = store.dump();
//! assert!(artifact.starts_with("window.BENCHMARK_DATA = "));
//! assert_eq!(HistoryStore::load(&artifact)?, store);
//! # Ok::<(), benchwatch_core::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`record`] - validated benchmark measurements
//! - [`commit`] - one CI run's results for one tool
//! - [`store`] - the append-only [`HistoryStore`]
//! - [`regression`] - baseline comparison and alerts
//! - [`codec`] - the `window.BENCHMARK_DATA` artifact format
//! - [`error`] - error taxonomy

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod codec;
pub mod commit;
pub mod error;
pub mod record;
pub mod regression;
pub mod store;

pub use commit::{CommitEntry, CommitInfo, Person};
pub use error::{
    AppendError, ConfigError, DecodeError, EntryError, Error, PolarityError, Result,
    ValidationError,
};
pub use record::{BenchmarkRecord, RawBenchmark};
pub use regression::{DetectorConfig, Polarity, RegressionAlert, RegressionDetector};
pub use store::HistoryStore;
