//! Repository file access.
//!
//! The rewriter and the CLI reach files through [`FileStore`] rather than
//! the filesystem directly, so tests can observe every write and production
//! code stays on async IO.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// File access over a checked-out repository.
///
/// Paths are repo-relative and use forward slashes on every platform.
pub trait FileStore {
    /// Read a UTF-8 file under `root`.
    fn read_file(&self, root: &Path, path: &str) -> impl Future<Output = Result<String>>;

    /// Write a UTF-8 file under `root`, replacing any existing content.
    fn write_file(&self, root: &Path, path: &str, text: &str) -> impl Future<Output = Result<()>>;
}

/// [`FileStore`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileStore;

impl FileStore for FsFileStore {
    async fn read_file(&self, root: &Path, path: &str) -> Result<String> {
        let full_path = join_repo_path(root, path);
        tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|source| {
                StoreError::ReadFailed {
                    root: root.to_path_buf(),
                    path: path.to_string(),
                    source,
                }
                .into()
            })
    }

    async fn write_file(&self, root: &Path, path: &str, text: &str) -> Result<()> {
        let full_path = join_repo_path(root, path);
        tokio::fs::write(&full_path, text).await.map_err(|source| {
            StoreError::WriteFailed {
                root: root.to_path_buf(),
                path: path.to_string(),
                source,
            }
            .into()
        })
    }
}

/// Join a forward-slash repo path onto a platform root.
fn join_repo_path(root: &Path, path: &str) -> PathBuf {
    let mut full_path = root.to_path_buf();
    full_path.extend(path.split('/'));
    full_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_repo_path_splits_segments() {
        let joined = join_repo_path(Path::new("/repo"), "packages/core/package.json");
        let expected: PathBuf = ["/repo", "packages", "core", "package.json"].iter().collect();
        assert_eq!(joined, expected);
    }

    #[test]
    fn test_join_repo_path_root_level_file() {
        assert_eq!(
            join_repo_path(Path::new("/repo"), "package.json"),
            PathBuf::from("/repo/package.json")
        );
    }

    #[tokio::test]
    async fn test_fs_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("packages/core")).unwrap();
        let store = FsFileStore;

        store
            .write_file(dir.path(), "packages/core/package.json", "{\"name\":\"core\"}")
            .await
            .unwrap();
        let read_back = store
            .read_file(dir.path(), "packages/core/package.json")
            .await
            .unwrap();
        assert_eq!(read_back, "{\"name\":\"core\"}");
    }

    #[tokio::test]
    async fn test_fs_store_read_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsFileStore;
        let result = store.read_file(dir.path(), "package.json").await;
        assert!(result.is_err());
    }
}
