// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the benchmark ledger.
//!
//! Every failure surfaces to the caller and blocks the mutation it guards.
//! Only [`PolarityError`] has a graceful path: the regression detector skips
//! the affected benchmark instead of failing the pass.

use thiserror::Error;

/// A benchmark record failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is absent (or empty, for `name`).
    #[error("benchmark record is missing required field `{0}`")]
    MissingField(&'static str),

    /// `value` is not a finite, non-negative number.
    #[error("benchmark `{name}` has invalid value {value}: expected a finite non-negative number")]
    InvalidValue {
        /// Name of the offending record.
        name: String,
        /// The rejected value, rendered as found in the input.
        value: String,
    },
}

/// A commit entry could not be constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryError {
    /// A run with zero benchmarks is not a valid entry.
    #[error("commit entry has an empty benchmark list")]
    EmptyBenchList,

    /// `commit.id` is not a full hexadecimal object name.
    #[error("malformed commit id `{0}`: expected 40 or 64 hexadecimal characters")]
    MalformedCommitId(String),

    /// Two records in the same entry share a name.
    #[error("benchmark `{0}` appears more than once in the same entry")]
    DuplicateBenchmark(String),

    /// The tool name is blank.
    #[error("commit entry has an empty tool name")]
    EmptyTool,

    /// A record failed validation.
    #[error("benchmark #{index} is invalid: {source}")]
    Record {
        /// Position of the record in `benches`.
        index: usize,
        /// Underlying validation failure.
        #[source]
        source: ValidationError,
    },
}

/// An append to the history store was rejected; the store is unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppendError {
    /// The commit is already recorded in this tool's series.
    #[error("commit {commit_id} is already recorded for tool `{tool}`")]
    DuplicateCommit {
        /// Tool series that already holds the commit.
        tool: String,
        /// The duplicated commit id.
        commit_id: String,
    },

    /// The entry was produced by a different tool than the target series.
    #[error("entry produced by tool `{entry}` cannot be appended to series `{series}`")]
    ToolMismatch {
        /// Target series name.
        series: String,
        /// Tool named inside the entry.
        entry: String,
    },
}

/// The serialized artifact could not be turned into a store.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not syntactically valid JSON.
    #[error("artifact is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// The JSON does not have the expected shape.
    #[error("artifact schema error: {0}")]
    Schema(String),

    /// An entry failed record or commit validation.
    #[error("entry #{index} of tool `{tool}` is invalid: {source}")]
    Entry {
        /// Tool series containing the entry.
        tool: String,
        /// Position of the entry in the series.
        index: usize,
        /// Underlying failure.
        #[source]
        source: EntryError,
    },

    /// The artifact itself violates ledger invariants (e.g. duplicate commits).
    #[error("artifact violates ledger invariants: {0}")]
    Append(#[from] AppendError),
}

impl DecodeError {
    /// Classify a serde_json failure as either a syntax or a schema problem.
    pub(crate) fn from_json(err: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match err.classify() {
            Category::Data => DecodeError::Schema(err.to_string()),
            Category::Io | Category::Syntax | Category::Eof => DecodeError::Json(err),
        }
    }
}

/// The regression detector cannot tell which direction is better for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolarityError {
    /// No override, inference rule or tool convention matched.
    #[error("cannot determine polarity for unit `{unit}`")]
    UnknownPolarity {
        /// The unclassifiable unit string.
        unit: String,
    },
}

/// Detector configuration is out of range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid detector configuration: {0}")]
pub struct ConfigError(pub String);

/// Umbrella error for callers that do not care which layer failed.
#[derive(Debug, Error)]
pub enum Error {
    /// Record validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Entry construction failed.
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// Append was rejected.
    #[error(transparent)]
    Append(#[from] AppendError),

    /// Artifact decoding failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Polarity could not be resolved.
    #[error(transparent)]
    Polarity(#[from] PolarityError),

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_commit_is_schema_error() {
        let err = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>("[1]")
            .unwrap_err();
        assert!(matches!(DecodeError::from_json(err), DecodeError::Schema(_)));
    }

    #[test]
    fn test_truncated_input_is_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{\"lastUpdate\": ").unwrap_err();
        assert!(matches!(DecodeError::from_json(err), DecodeError::Json(_)));
    }

    #[test]
    fn test_entry_error_mentions_index() {
        let err = EntryError::Record {
            index: 3,
            source: ValidationError::MissingField("unit"),
        };
        let message = err.to_string();
        assert!(message.contains("#3"));
        assert!(message.contains("unit"));
    }
}
