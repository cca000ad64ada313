//! Safe file I/O utilities: atomic writes and best-effort removal.
//!
//! - [`atomic_write_json()`] - Serialize a value and write it atomically
//! - [`atomic_write()`] - Write bytes atomically (temp file + fsync + rename)
//! - [`remove_if_exists()`] - Remove a file, treating "already gone" as success
//!
//! Readers of a file written through [`atomic_write()`] observe either the
//! previous content or the new content, never a mix of both. The temporary
//! sibling carries the writer's pid so two processes committing the same
//! target at once never share a temp file.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Atomically write `value` as compact JSON to `path`.
///
/// # Errors
///
/// Returns an error if serialization fails or if [`atomic_write()`] fails.
pub fn atomic_write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let json =
        serde_json::to_vec(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    atomic_write(path, &json)
}

/// Atomically write bytes to a file.
///
/// Writes to a temporary sibling with fsync, then renames onto the target.
/// On failure the temporary file is removed; the target is left untouched.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, or if the
/// temporary file cannot be created, written, synced, or renamed.
pub fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    let result = write_and_rename(&tmp_path, path, contents);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_and_rename(tmp_path: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(tmp_path)?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(contents)?;
        writer.flush()?;
    }

    // Sync to disk before rename
    file.sync_all()?;

    fs::rename(tmp_path, path)
}

/// Temporary sibling path used while writing `path`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

/// Remove a file, returning `Ok(())` when it does not exist.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_basic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");

        atomic_write(&path, b"hello world").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hello world");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("test.txt");

        atomic_write(&path, b"nested content").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "nested content");
    }

    #[test]
    fn test_atomic_write_json_is_compact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("context.json");

        atomic_write_json(&path, &[1, 2, 3]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[1,2,3]");
    }

    #[test]
    fn test_atomic_write_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");

        atomic_write(&path, b"original").unwrap();
        atomic_write(&path, b"updated").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "updated");
    }

    #[test]
    fn test_atomic_write_no_tmp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");

        atomic_write(&path, b"content").unwrap();

        assert!(path.exists());
        assert!(!temp_path_for(&path).exists(), "temp file should be cleaned up");
    }

    #[test]
    fn test_atomic_write_failure_leaves_target_untouched() {
        let temp_dir = TempDir::new().unwrap();
        // A directory at the target path makes the final rename fail.
        let path = temp_dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inner"), "x").unwrap();

        assert!(atomic_write(&path, b"data").is_err());
        assert!(path.is_dir());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let path = Path::new("/tmp/ai/context.json");
        let tmp = temp_path_for(path);
        assert_eq!(tmp.parent(), path.parent());
        let name = tmp.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(".context.json."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn test_remove_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.json");

        remove_if_exists(&path).unwrap();
        fs::write(&path, "[]").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
