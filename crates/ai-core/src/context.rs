//! Rolling context persistence.
//!
//! The rolling context is the opaque array of integers the backend returns
//! at the end of every turn. It is never interpreted here: the only
//! operations are whole-array load, truncate-from-front, and whole-array
//! store.
//!
//! # Shared state
//!
//! One context file is shared by every running invocation. Two invocations
//! started close together both load the same prior context, and whichever
//! commits last wins: the other turn's answer was shown to its user but is
//! absent from the persisted conversation. No locking is performed; use
//! [`ContextStore::reset`] to start over.

use crate::safe_io::{atomic_write_json, remove_if_exists, temp_path_for};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Ordered opaque context elements returned by the backend.
pub type RollingContext = Vec<i64>;

/// Sizes before and after a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReport {
    pub before: usize,
    pub after: usize,
}

impl CommitReport {
    /// Number of oldest elements discarded.
    pub fn dropped(&self) -> usize {
        self.before.saturating_sub(self.after)
    }

    pub fn pruned(&self) -> bool {
        self.dropped() > 0
    }
}

/// Keep the most recent `max_size` elements, preserving their order.
pub fn prune(context: &[i64], max_size: usize) -> &[i64] {
    let drop = context.len().saturating_sub(max_size);
    &context[drop..]
}

/// On-disk owner of the rolling context.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored context.
    ///
    /// A missing or empty file is an empty context. A file that is not a
    /// valid integer array is reported as a warning and treated as empty,
    /// so the turn can still proceed without context.
    pub fn load(&self) -> RollingContext {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!(
                    "cannot read context file {}: {}; continuing without context",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        if content.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<RollingContext>(&content) {
            Ok(context) => context,
            Err(e) => {
                log::warn!(
                    "context file {} is not a valid array ({}); continuing without context",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Replace the stored context with an empty array.
    pub fn reset(&self) -> io::Result<()> {
        atomic_write_json(&self.path, &[] as &[i64])
    }

    /// Validate, prune, and persist a context freshly returned by the backend.
    ///
    /// On any validation or write failure the context file is removed, so
    /// the next invocation starts without context rather than reading a
    /// corrupt one.
    pub fn commit(&self, raw: &serde_json::Value, max_size: usize) -> io::Result<CommitReport> {
        let context: RollingContext = match serde_json::from_value(raw.clone()) {
            Ok(context) => context,
            Err(e) => {
                self.discard();
                return Err(io::Error::new(
                    ErrorKind::InvalidData,
                    format!("backend context is not an integer array: {}", e),
                ));
            }
        };

        let kept = prune(&context, max_size);
        let report = CommitReport {
            before: context.len(),
            after: kept.len(),
        };

        if let Err(e) = atomic_write_json(&self.path, kept) {
            self.discard();
            return Err(e);
        }

        Ok(report)
    }

    fn discard(&self) {
        for path in [temp_path_for(&self.path), self.path.clone()] {
            if let Err(e) = remove_if_exists(&path) {
                log::warn!("failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (ContextStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ContextStore::new(temp_dir.path().join("context.json"));
        (store, temp_dir)
    }

    #[test]
    fn test_load_missing_is_empty() {
        let (store, _dir) = create_test_store();
        assert!(store.load().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_load_valid_array() {
        let (store, _dir) = create_test_store();
        fs::write(store.path(), "[1, 2, 3]\n").unwrap();
        assert_eq!(store.load(), vec![1, 2, 3]);
    }

    #[test]
    fn test_load_invalid_is_empty() {
        let (store, _dir) = create_test_store();
        for bad in ["[1, 2,", "{\"a\": 1}", "\"text\"", "[1, \"two\"]", "null"] {
            fs::write(store.path(), bad).unwrap();
            assert!(store.load().is_empty(), "{}", bad);
        }
    }

    #[test]
    fn test_load_blank_file_is_empty() {
        let (store, _dir) = create_test_store();
        fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_reset_then_load_is_empty() {
        let (store, _dir) = create_test_store();
        fs::write(store.path(), "[4, 5, 6]").unwrap();

        store.reset().unwrap();
        assert!(store.load().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");

        // Idempotent, and works on garbage content too
        store.reset().unwrap();
        fs::write(store.path(), "garbage").unwrap();
        store.reset().unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_reset_creates_missing_home() {
        let temp_dir = TempDir::new().unwrap();
        let store = ContextStore::new(temp_dir.path().join("fresh").join("context.json"));
        store.reset().unwrap();
        assert!(store.load().is_empty());
        assert!(store.path().exists());
    }

    #[test]
    fn test_commit_under_limit_is_verbatim() {
        let (store, _dir) = create_test_store();
        let report = store.commit(&json!([9, 9]), 10).unwrap();
        assert_eq!(report, CommitReport { before: 2, after: 2 });
        assert!(!report.pruned());
        assert_eq!(store.load(), vec![9, 9]);
    }

    #[test]
    fn test_commit_at_limit_is_verbatim() {
        let (store, _dir) = create_test_store();
        let report = store.commit(&json!([1, 2, 3]), 3).unwrap();
        assert_eq!(report.dropped(), 0);
        assert_eq!(store.load(), vec![1, 2, 3]);
    }

    #[test]
    fn test_commit_prunes_oldest() {
        let (store, _dir) = create_test_store();
        fs::write(store.path(), "[1,2,3,4,5]").unwrap();

        let report = store.commit(&json!([1, 2, 3, 4, 5, 6, 7]), 3).unwrap();

        assert_eq!(report, CommitReport { before: 7, after: 3 });
        assert_eq!(report.dropped(), 4);
        assert_eq!(store.load(), vec![5, 6, 7]);
    }

    #[test]
    fn test_commit_then_load_keeps_last_min_l_m() {
        let (store, _dir) = create_test_store();
        for len in 0..12usize {
            for max in 1..8usize {
                let input: Vec<i64> = (0..len as i64).map(|n| n * 10 - 7).collect();
                store.commit(&json!(input), max).unwrap();
                let stored = store.load();
                let keep = len.min(max);
                assert_eq!(stored.len(), keep);
                assert_eq!(stored.as_slice(), &input[len - keep..]);
            }
        }
    }

    #[test]
    fn test_commit_invalid_removes_file() {
        let (store, _dir) = create_test_store();
        fs::write(store.path(), "[1,2,3]").unwrap();

        for bad in [json!("nope"), json!([1, "x"]), json!({"a": 1}), json!([1.5])] {
            fs::write(store.path(), "[1,2,3]").unwrap();
            let err = store.commit(&bad, 10).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidData);
            assert!(!store.path().exists(), "corrupt commit must leave no file");
            assert!(store.load().is_empty());
        }
    }

    #[test]
    fn test_commit_write_failure_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        // Parent "directory" is a regular file, so nothing can be written below it
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let store = ContextStore::new(blocker.join("context.json"));

        assert!(store.commit(&json!([1, 2]), 5).is_err());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_commit_write_failure_removes_existing_file() {
        let (store, _dir) = create_test_store();
        fs::write(store.path(), "[1,2,3]").unwrap();
        // A directory squatting on the temp path makes the write fail
        let tmp = temp_path_for(store.path());
        fs::create_dir(&tmp).unwrap();
        fs::write(tmp.join("keep"), "x").unwrap();

        assert!(store.commit(&json!([4, 5]), 5).is_err());
        assert!(!store.path().exists(), "stale context must not survive");
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_dropped_never_underflows() {
        let report = CommitReport {
            before: 2,
            after: 5,
        };
        assert_eq!(report.dropped(), 0);
        assert!(!report.pruned());
    }

    #[test]
    fn test_prune() {
        assert_eq!(prune(&[1, 2, 3, 4], 2), &[3, 4]);
        assert_eq!(prune(&[1, 2], 5), &[1, 2]);
        assert!(prune(&[], 3).is_empty());
    }
}
