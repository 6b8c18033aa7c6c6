// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! The append-only benchmark ledger.
//!
//! A [`HistoryStore`] maps each tool name to the chronological list of
//! [`CommitEntry`] values it produced. The only mutation is
//! [`HistoryStore::append`]; recorded entries are never updated or removed.
//!
//! ```text
//! HistoryStore
//!   └─ tool ("pytest", "cargo", ...)
//!       └─ CommitEntry (one per CI run, oldest first)
//!           └─ BenchmarkRecord (one per scenario)
//! ```

use crate::codec;
use crate::commit::CommitEntry;
use crate::error::{AppendError, DecodeError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// The whole persisted benchmark history of one repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStore {
    #[serde(rename = "lastUpdate")]
    last_update: i64,
    #[serde(rename = "repoUrl")]
    repo_url: String,
    entries: BTreeMap<String, Vec<CommitEntry>>,
}

impl HistoryStore {
    /// Create an empty store for a repository.
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: 0,
            repo_url: repo_url.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Decode a store from the artifact text.
    pub fn load(serialized: &str) -> Result<Self, DecodeError> {
        codec::decode(serialized)
    }

    /// Encode the store into the artifact text.
    pub fn dump(&self) -> String {
        codec::encode(self)
    }

    /// Append an entry to the series of `tool`, creating the series if needed.
    ///
    /// On success `last_update` becomes `max(last_update, entry.date())`.
    /// On failure the store is left untouched.
    ///
    /// # Errors
    ///
    /// - [`AppendError::ToolMismatch`] if `entry` was produced by another tool.
    /// - [`AppendError::DuplicateCommit`] if the commit is already in the series.
    pub fn append(&mut self, tool: &str, entry: CommitEntry) -> Result<(), AppendError> {
        if entry.tool() != tool {
            return Err(AppendError::ToolMismatch {
                series: tool.to_string(),
                entry: entry.tool().to_string(),
            });
        }
        if self.contains_commit(tool, &entry.commit().id) {
            return Err(AppendError::DuplicateCommit {
                tool: tool.to_string(),
                commit_id: entry.commit().id.clone(),
            });
        }

        if !self.entries.contains_key(tool) {
            info!(tool, "Starting new benchmark series");
        }
        debug!(
            tool,
            commit = %entry.commit().short_id(),
            date = entry.date(),
            benches = entry.benches().len(),
            "Appending commit entry"
        );

        self.last_update = self.last_update.max(entry.date());
        self.entries
            .entry(tool.to_string())
            .or_default()
            .push(entry);
        Ok(())
    }

    /// Chronological `(date, value)` pairs for one benchmark of one tool.
    ///
    /// Commits that did not run the benchmark are skipped. The iterator
    /// borrows the store, so calling this again restarts from the beginning.
    pub fn series_for<'a>(
        &'a self,
        tool: &str,
        benchmark_name: &'a str,
    ) -> impl Iterator<Item = (i64, f64)> + 'a {
        series_of(self.entries_for(tool), benchmark_name)
    }

    /// Like [`series_for`](Self::series_for), but stops before `commit_id`.
    ///
    /// If the commit is not recorded the whole series is returned, so the
    /// same call serves both before and after the commit is appended.
    pub fn series_before<'a>(
        &'a self,
        tool: &str,
        benchmark_name: &'a str,
        commit_id: &str,
    ) -> impl Iterator<Item = (i64, f64)> + 'a {
        let entries = self.entries_for(tool);
        let end = entries
            .iter()
            .position(|entry| entry.commit().id == commit_id)
            .unwrap_or(entries.len());
        series_of(&entries[..end], benchmark_name)
    }

    /// Provenance link of the repository.
    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    /// Epoch milliseconds of the most recent append.
    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    /// Tool names in deterministic order.
    pub fn tools(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All entries of a tool, oldest first. Empty for an unknown tool.
    pub fn entries_for(&self, tool: &str) -> &[CommitEntry] {
        self.entries.get(tool).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Most recently appended entry of a tool.
    pub fn latest(&self, tool: &str) -> Option<&CommitEntry> {
        self.entries_for(tool).last()
    }

    /// Whether `commit_id` is already recorded for `tool`.
    pub fn contains_commit(&self, tool: &str, commit_id: &str) -> bool {
        self.entries_for(tool)
            .iter()
            .any(|entry| entry.commit().id == commit_id)
    }

    /// Every benchmark name ever recorded for a tool, sorted.
    pub fn benchmark_names(&self, tool: &str) -> BTreeSet<&str> {
        self.entries_for(tool)
            .iter()
            .flat_map(|entry| entry.benches().iter().map(|b| b.name()))
            .collect()
    }

    /// Total number of entries across all tools.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether the store is still in its initial state.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn set_last_update(&mut self, last_update: i64) {
        self.last_update = last_update;
    }
}

fn series_of<'a>(
    entries: &'a [CommitEntry],
    benchmark_name: &'a str,
) -> impl Iterator<Item = (i64, f64)> + 'a {
    entries.iter().filter_map(move |entry| {
        entry
            .bench(benchmark_name)
            .map(|record| (entry.date(), record.value()))
    })
}
