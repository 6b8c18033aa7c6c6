//! I/O operations for the benchmark artifact.
//!
//! This module reads and writes the `window.BENCHMARK_DATA` script on disk.
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so readers never see a half-written artifact and
//! a failed run leaves the previous artifact in place.

use crate::error::{Result, StorageError};
use benchwatch_core::HistoryStore;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Default artifact location, relative to the published site root.
pub const DEFAULT_DATA_FILE: &str = "dev/bench/data.js";

/// Read and decode the artifact at `path`.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn load(path: impl AsRef<Path>) -> Result<HistoryStore> {
    let path = path.as_ref();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(path.to_path_buf()))
        }
        Err(err) => return Err(StorageError::io(path, err)),
    };

    let store = HistoryStore::load(&text).map_err(|source| StorageError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(entries = store.len(), "Loaded benchmark history");
    Ok(store)
}

/// Load the artifact, or start an empty ledger for `repo_url` if the file
/// does not exist yet.
pub fn load_or_new(path: impl AsRef<Path>, repo_url: &str) -> Result<HistoryStore> {
    match load(path.as_ref()) {
        Err(StorageError::NotFound(path)) => {
            info!(path = %path.display(), "No benchmark data yet, starting a new ledger");
            Ok(HistoryStore::new(repo_url))
        }
        other => other,
    }
}

/// Encode `store` and atomically replace the artifact at `path`.
///
/// Missing parent directories are created.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn save(path: impl AsRef<Path>, store: &HistoryStore) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
    // the artifact is served as a static file; temp files start out owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| StorageError::io(tmp.path(), e))?;
    }
    tmp.write_all(store.dump().as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StorageError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| StorageError::io(path, e.error))?;

    info!(
        entries = store.len(),
        last_update = store.last_update(),
        "Wrote benchmark history"
    );
    Ok(())
}

/// Create an empty artifact for `repo_url`.
///
/// Fails with [`StorageError::AlreadyExists`] unless `force` is set.
pub fn init(path: impl AsRef<Path>, repo_url: &str, force: bool) -> Result<HistoryStore> {
    let path = path.as_ref();
    if path.exists() && !force {
        return Err(StorageError::AlreadyExists(path.to_path_buf()));
    }
    let store = HistoryStore::new(repo_url);
    save(path, &store)?;
    Ok(store)
}

/// Run the load → mutate → persist cycle on the artifact at `path`.
///
/// `mutate` receives the decoded store (or a fresh one for `repo_url` when
/// the file does not exist). The artifact is rewritten only if `mutate`
/// returns `Ok`; on any error the file is left byte-for-byte unchanged.
///
/// Callers must ensure only one update runs against a given file at a time.
pub fn update<T, E, F>(path: impl AsRef<Path>, repo_url: &str, mutate: F) -> std::result::Result<T, E>
where
    F: FnOnce(&mut HistoryStore) -> std::result::Result<T, E>,
    E: From<StorageError>,
{
    let path = path.as_ref();
    let mut store = load_or_new(path, repo_url)?;
    let outcome = mutate(&mut store)?;
    save(path, &store)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchwatch_core::{AppendError, BenchmarkRecord, CommitEntry, CommitInfo, Person};
    use tempfile::TempDir;

    fn entry(n: u32) -> CommitEntry {
        let commit = CommitInfo {
            author: Person::new("Ada", "ada@example.com", "ada"),
            committer: Person::new("Ada", "ada@example.com", "ada"),
            distinct: Some(true),
            id: format!("{n:040x}"),
            message: "bench".to_string(),
            timestamp: "2024-03-01T12:00:00Z".to_string(),
            tree_id: None,
            url: "https://github.com/example/project".to_string(),
        };
        let records = vec![BenchmarkRecord::new("a", 10.0, "ns").unwrap()];
        CommitEntry::create(commit, i64::from(n), "cargo", records).unwrap()
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(dir.path().join("data.js")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_init_creates_directories_and_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dev/bench/data.js");

        init(&path, "https://github.com/example/project", false).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("window.BENCHMARK_DATA = "));

        let err = init(&path, "https://github.com/example/project", false).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert!(init(&path, "https://github.com/example/project", true).is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.js");
        let mut store = HistoryStore::new("repo");
        store.append("cargo", entry(1)).unwrap();

        save(&path, &store).unwrap();
        assert_eq!(load(&path).unwrap(), store);
    }

    #[test]
    fn test_corrupt_file_reports_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.js");
        fs::write(&path, "window.BENCHMARK_DATA = {").unwrap();
        assert!(matches!(load(&path).unwrap_err(), StorageError::Decode { .. }));
    }

    #[derive(Debug)]
    enum UpdateError {
        Storage(StorageError),
        Append(AppendError),
    }

    impl From<StorageError> for UpdateError {
        fn from(err: StorageError) -> Self {
            UpdateError::Storage(err)
        }
    }

    #[test]
    fn test_update_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.js");

        let count = update(&path, "repo", |store| {
            store.append("cargo", entry(1)).map_err(UpdateError::Append)?;
            Ok::<_, UpdateError>(store.len())
        })
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(load(&path).unwrap().repo_url(), "repo");
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.js");
        update(&path, "repo", |store| {
            store.append("cargo", entry(1)).map_err(UpdateError::Append)
        })
        .unwrap();
        let before = fs::read(&path).unwrap();

        let err = update(&path, "repo", |store| {
            store.append("cargo", entry(2)).map_err(UpdateError::Append)?;
            store.append("cargo", entry(1)).map_err(UpdateError::Append)
        })
        .unwrap_err();
        assert!(matches!(err, UpdateError::Append(AppendError::DuplicateCommit { .. })));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_artifact_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.js");
        save(&path, &HistoryStore::new("repo")).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
