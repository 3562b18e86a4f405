//! Filesystem helpers shared across modules.
//!
//! These helpers attach the operation and path to IO errors so log lines
//! say what was attempted and where.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Ensure a directory exists, creating it (recursively) if needed.
pub async fn ensure_dir_all_with_op(op: &'static str, path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| Error::io_path(op, path, e))
}

/// Blocking variant for startup code that runs before the runtime matters.
pub fn ensure_dir_all_sync_with_op(op: &'static str, path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::io_path(op, path, e))
}

/// Rename `from` to `to`. Same-filesystem renames are atomic; anything else
/// (e.g. `EXDEV`) is reported to the caller unchanged.
pub async fn rename(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|e| Error::io_path("moving file", from, e))
}

/// Remove a file, treating "already gone" as success.
pub async fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io_path("removing file", path, e)),
    }
}

/// Regular files directly under `dir`, sorted by name. Subdirectories and
/// their contents are ignored.
pub async fn list_regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::io_path("listing directory", dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_path("listing directory", dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| Error::io_path("reading file type", &entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_dir_all_creates_nested_directories() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("level1").join("level2");

        ensure_dir_all_with_op("creating directory", &nested).await.unwrap();
        assert!(nested.is_dir());
        // idempotent
        ensure_dir_all_with_op("creating directory", &nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_regular_files_skips_directories() {
        let temp = TempDir::new().unwrap();
        tokio::fs::write(temp.path().join("b.mp4"), b"b").await.unwrap();
        tokio::fs::write(temp.path().join("a.mp4"), b"a").await.unwrap();
        tokio::fs::create_dir(temp.path().join("nested")).await.unwrap();
        tokio::fs::write(temp.path().join("nested").join("c.mp4"), b"c")
            .await
            .unwrap();

        let files = list_regular_files(temp.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mp4", "b.mp4"]);
    }

    #[tokio::test]
    async fn test_rename_missing_source_reports_not_found() {
        let temp = TempDir::new().unwrap();
        let err = rename(&temp.path().join("missing"), &temp.path().join("dst"))
            .await
            .unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_remove_file_if_exists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x");
        tokio::fs::write(&path, b"x").await.unwrap();
        assert!(remove_file_if_exists(&path).await.unwrap());
        assert!(!remove_file_if_exists(&path).await.unwrap());
    }
}
