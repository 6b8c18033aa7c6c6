// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Commit entries: one CI run's benchmark results for one tool.
//!
//! The commit metadata mirrors the push-event payload the CI collaborator
//! hands over. `distinct`, `tree_id` and `username` are absent when the
//! commit was looked up through the hosting API instead, so they are
//! optional and omitted from the encoded artifact when missing.

use crate::error::EntryError;
use crate::record::BenchmarkRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Full SHA-1 or SHA-256 object name.
static COMMIT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9a-fA-F]{40}|[0-9a-fA-F]{64})$").expect("commit id pattern is valid")
});

/// Author or committer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Hosting-service account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Person {
    /// Create a person with all three fields set.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            username: Some(username.into()),
        }
    }
}

/// Immutable identity of the benchmarked commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit author.
    pub author: Person,
    /// Commit committer.
    pub committer: Person,
    /// Whether the commit was new to the pushed ref.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    /// Full commit hash.
    pub id: String,
    /// Commit message.
    pub message: String,
    /// ISO-8601 commit timestamp.
    pub timestamp: String,
    /// Tree object hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,
    /// Link to the commit on the hosting service.
    pub url: String,
}

impl CommitInfo {
    /// Whether `id` has the shape of a full object name.
    pub fn has_valid_id(&self) -> bool {
        COMMIT_ID.is_match(&self.id)
    }

    /// Abbreviated commit hash for display.
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// One CI run's complete output for one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitEntry {
    commit: CommitInfo,
    date: i64,
    tool: String,
    benches: Vec<BenchmarkRecord>,
}

impl CommitEntry {
    /// Construct an entry from validated parts.
    ///
    /// # Errors
    ///
    /// - [`EntryError::EmptyBenchList`] if `records` is empty.
    /// - [`EntryError::MalformedCommitId`] if `commit.id` is not 40 or 64 hex characters.
    /// - [`EntryError::DuplicateBenchmark`] if two records share a name.
    /// - [`EntryError::EmptyTool`] if `tool` is blank.
    pub fn create(
        commit: CommitInfo,
        date: i64,
        tool: impl Into<String>,
        records: Vec<BenchmarkRecord>,
    ) -> Result<Self, EntryError> {
        let tool = tool.into();
        if tool.trim().is_empty() {
            return Err(EntryError::EmptyTool);
        }
        if !commit.has_valid_id() {
            return Err(EntryError::MalformedCommitId(commit.id));
        }
        if records.is_empty() {
            return Err(EntryError::EmptyBenchList);
        }

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.name()) {
                return Err(EntryError::DuplicateBenchmark(record.name().to_string()));
            }
        }

        Ok(Self {
            commit,
            date,
            tool,
            benches: records,
        })
    }

    /// Commit metadata.
    pub fn commit(&self) -> &CommitInfo {
        &self.commit
    }

    /// CI run time in epoch milliseconds.
    pub fn date(&self) -> i64 {
        self.date
    }

    /// Harness that produced the records.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Records in emission order.
    pub fn benches(&self) -> &[BenchmarkRecord] {
        &self.benches
    }

    /// Look up a record by name.
    pub fn bench(&self, name: &str) -> Option<&BenchmarkRecord> {
        self.benches.iter().find(|b| b.name() == name)
    }
}
