// Copyright 2025 Benchwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Conversion between [`HistoryStore`] and the persisted artifact.
//!
//! The artifact is a script that a static dashboard loads directly:
//!
//! ```text
//! window.BENCHMARK_DATA = {
//!   "lastUpdate": 1700000000000,
//!   "repoUrl": "https://github.com/example/project",
//!   "entries": { "<tool>": [ <CommitEntry>, ... ] }
//! }
//! ```
//!
//! Decoding validates every entry and record and either yields a complete
//! store or an error; there is no partial result. Encoding is
//! deterministic: fields are written in a fixed order, tools in sorted
//! order, with two-space indentation and no trailing newline.

use crate::commit::{CommitEntry, CommitInfo};
use crate::error::{DecodeError, EntryError};
use crate::record::{BenchmarkRecord, RawBenchmark};
use crate::store::HistoryStore;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Global the dashboard reads the data from.
pub const SCRIPT_GLOBAL: &str = "window.BENCHMARK_DATA";

/// Assignment written in front of the JSON payload.
pub const SCRIPT_PREFIX: &str = "window.BENCHMARK_DATA = ";

#[derive(Debug, Deserialize)]
struct RawStore {
    #[serde(rename = "lastUpdate")]
    last_update: i64,
    #[serde(rename = "repoUrl")]
    repo_url: String,
    #[serde(deserialize_with = "unique_series")]
    entries: BTreeMap<String, Vec<RawEntry>>,
}

/// Tool map that rejects a repeated key instead of keeping the last copy.
fn unique_series<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<RawEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SeriesVisitor;

    impl<'de> Visitor<'de> for SeriesVisitor {
        type Value = BTreeMap<String, Vec<RawEntry>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of tool names to entry lists")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut series = BTreeMap::new();
            while let Some(tool) = map.next_key::<String>()? {
                if series.contains_key(&tool) {
                    return Err(de::Error::custom(format_args!("duplicate series `{tool}`")));
                }
                let entries = map.next_value()?;
                series.insert(tool, entries);
            }
            Ok(series)
        }
    }

    deserializer.deserialize_map(SeriesVisitor)
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    commit: CommitInfo,
    date: i64,
    tool: String,
    benches: Vec<RawBenchmark>,
}

impl RawEntry {
    fn into_entry(self) -> Result<CommitEntry, EntryError> {
        let records = self
            .benches
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                BenchmarkRecord::validate(raw).map_err(|source| EntryError::Record { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        CommitEntry::create(self.commit, self.date, self.tool, records)
    }
}

/// Decode artifact text into a store.
///
/// Accepts the bare JSON object as well as the script form, with or without
/// a trailing semicolon.
///
/// # Errors
///
/// - [`DecodeError::Json`] for malformed JSON.
/// - [`DecodeError::Schema`] when the shape is wrong, e.g. an entry without
///   `commit`, or an entry whose `tool` disagrees with its series key.
/// - [`DecodeError::Entry`] when a record or commit fails validation.
/// - [`DecodeError::Append`] when a commit appears twice in one series.
pub fn decode(text: &str) -> Result<HistoryStore, DecodeError> {
    let payload = strip_script(text)?;
    let raw: RawStore = serde_json::from_str(payload).map_err(DecodeError::from_json)?;

    let mut store = HistoryStore::new(raw.repo_url);
    for (tool, raw_entries) in raw.entries {
        for (index, raw_entry) in raw_entries.into_iter().enumerate() {
            if raw_entry.tool != tool {
                return Err(DecodeError::Schema(format!(
                    "entry #{index} of series `{tool}` names tool `{}`",
                    raw_entry.tool
                )));
            }
            let entry = raw_entry.into_entry().map_err(|source| DecodeError::Entry {
                tool: tool.clone(),
                index,
                source,
            })?;
            store.append(&tool, entry)?;
        }
    }
    // never older than the newest entry
    if raw.last_update < store.last_update() {
        warn!(
            file = raw.last_update,
            newest_entry = store.last_update(),
            "lastUpdate predates the newest entry, using the entry date"
        );
    } else {
        store.set_last_update(raw.last_update);
    }

    debug!(
        tools = store.tools().count(),
        entries = store.len(),
        last_update = store.last_update(),
        "Decoded benchmark history"
    );
    Ok(store)
}

/// Encode a store into artifact text.
pub fn encode(store: &HistoryStore) -> String {
    let json = serde_json::to_string_pretty(store)
        .expect("history store serialization has no fallible fields");
    format!("{SCRIPT_PREFIX}{json}")
}

/// Decode a single entry document, as handed over by the CI collaborator.
///
/// The document has the same shape as one element of a series in the
/// artifact.
pub fn decode_entry(text: &str) -> Result<CommitEntry, DecodeError> {
    let raw: RawEntry = serde_json::from_str(text.trim()).map_err(DecodeError::from_json)?;
    let tool = raw.tool.clone();
    raw.into_entry()
        .map_err(|source| DecodeError::Entry {
            tool,
            index: 0,
            source,
        })
}

/// Encode a single entry document.
pub fn encode_entry(entry: &CommitEntry) -> String {
    serde_json::to_string_pretty(entry).expect("commit entry serialization has no fallible fields")
}

fn strip_script(text: &str) -> Result<&str, DecodeError> {
    let text = text.trim();
    let payload = match text.strip_prefix(SCRIPT_GLOBAL) {
        Some(rest) => rest.trim_start().strip_prefix('=').ok_or_else(|| {
            DecodeError::Schema(format!("expected `=` after `{SCRIPT_GLOBAL}`"))
        })?,
        None => text,
    };
    let payload = payload.trim();
    Ok(payload.strip_suffix(';').unwrap_or(payload).trim_end())
}
