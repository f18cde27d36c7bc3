//! Shared test doubles and fixtures for the publish flow.

#![allow(dead_code)]

use monopub::error::{Result, StoreError};
use monopub::manifest::{PackageManifest, PublishConfigAccess};
use monopub::store::FileStore;
use monopub::PublishConfig;
use semver::Version;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory [`FileStore`] that records every write it receives.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    files: HashMap<String, String>,
    writes: Vec<(String, String)>,
    fail_writes_to: Option<String>,
    interrupt_write_to: Option<(String, String)>,
}

impl MemoryStore {
    pub fn with_file(path: &str, content: &str) -> Self {
        let store = Self::default();
        store
            .inner
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), content.to_string());
        store
    }

    /// Current content of `path`, or empty if missing.
    pub fn content(&self, path: &str) -> String {
        self.inner
            .lock()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Every write performed, in order, as (path, content) pairs.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().writes.clone()
    }

    /// Make any future write to `path` fail.
    pub fn fail_writes_to(&self, path: &str) {
        self.inner.lock().unwrap().fail_writes_to = Some(path.to_string());
    }

    /// Make the next write to `path` stop partway: `partial` is what lands
    /// before the write reports a failure. Later writes succeed again.
    pub fn interrupt_next_write_to(&self, path: &str, partial: &str) {
        self.inner.lock().unwrap().interrupt_write_to =
            Some((path.to_string(), partial.to_string()));
    }
}

impl FileStore for MemoryStore {
    async fn read_file(&self, root: &Path, path: &str) -> Result<String> {
        self.inner
            .lock()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| {
                StoreError::ReadFailed {
                    root: root.to_path_buf(),
                    path: path.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                }
                .into()
            })
    }

    async fn write_file(&self, root: &Path, path: &str, text: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .interrupt_write_to
            .as_ref()
            .is_some_and(|(interrupted, _)| interrupted == path)
        {
            let (_, partial) = inner.interrupt_write_to.take().unwrap();
            inner.files.insert(path.to_string(), partial);
            return Err(StoreError::WriteFailed {
                root: root.to_path_buf(),
                path: path.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write interrupted partway",
                ),
            }
            .into());
        }
        if inner.fail_writes_to.as_deref() == Some(path) {
            return Err(StoreError::WriteFailed {
                root: root.to_path_buf(),
                path: path.to_string(),
                source: std::io::Error::other("injected write failure"),
            }
            .into());
        }
        inner.files.insert(path.to_string(), text.to_string());
        inner.writes.push((path.to_string(), text.to_string()));
        Ok(())
    }
}

/// A public, non-private package rooted at `path`.
pub fn package(name: &str, path: &str) -> PackageManifest {
    PackageManifest {
        package_name: name.to_string(),
        path: path.to_string(),
        publish_config_access: PublishConfigAccess::Public,
        not_to_be_published: false,
    }
}

/// Publish settings against a fixed fake repository root.
pub fn config(dry_run: bool, canary: Option<&str>) -> PublishConfig {
    PublishConfig {
        dirname: PathBuf::from("/repo"),
        dry_run,
        canary: canary.map(String::from),
    }
}

pub fn version(text: &str) -> Version {
    Version::parse(text).unwrap()
}

/// Sibling version map from (name, version) pairs; `None` marks a sibling
/// that is present but not re-versioned.
pub fn sibling_versions(entries: &[(&str, Option<&str>)]) -> HashMap<String, Option<Version>> {
    entries
        .iter()
        .map(|&(name, v)| (name.to_string(), v.map(version)))
        .collect()
}
