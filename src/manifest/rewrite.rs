//! Publish-scoped manifest rewriting.
//!
//! The registry publishes whatever is on disk, so the rewriter temporarily
//! replaces a manifest with a version-substituted copy, runs an effect (a
//! publish or a dry run), and puts the original bytes back before returning.

use semver::Version;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;

use crate::PublishConfig;
use crate::error::{ManifestError, Result};
use crate::manifest::{PackageManifest, format};
use crate::store::FileStore;

/// Dependency blocks that receive version substitutions. `peerDependencies`
/// entries are never rewritten.
const REWRITTEN_DEPENDENCY_FIELDS: [&str; 3] =
    ["dependencies", "optionalDependencies", "devDependencies"];

/// Run `effect` while the manifest at `pkg.path` carries `new_version` and
/// updated sibling dependency ranges.
///
/// The original manifest text is restored on every path, including when the
/// rewritten text cannot be written out or the effect fails. A failure to
/// restore supersedes the earlier error.
pub async fn with_rewritten_manifest<S, F, Fut, T>(
    config: &PublishConfig,
    pkg: &PackageManifest,
    new_version: &Version,
    package_versions: &HashMap<String, Option<Version>>,
    store: &S,
    effect: F,
) -> Result<T>
where
    S: FileStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let original = store.read_file(&config.dirname, &pkg.path).await?;
    let rewritten = rewrite_manifest_text(
        &original,
        &pkg.path,
        new_version,
        package_versions,
        config.canary.is_some(),
    )?;

    log::debug!("Writing {} as version {new_version}", pkg.path);
    let outcome = match store.write_file(&config.dirname, &pkg.path, &rewritten).await {
        Ok(()) => effect().await,
        Err(write_error) => Err(write_error),
    };

    if let Err(restore_error) = store.write_file(&config.dirname, &pkg.path, &original).await {
        if let Err(failure) = &outcome {
            log::error!(
                "Publishing {} failed ({failure}) and the original manifest could not be restored",
                pkg.path
            );
        }
        return Err(restore_error);
    }
    log::debug!("Restored original {}", pkg.path);

    outcome
}

/// Produce the rewritten manifest text: the `version` field is replaced and
/// dependency ranges on sibling packages are re-pinned to their new versions.
fn rewrite_manifest_text(
    original: &str,
    path: &str,
    new_version: &Version,
    package_versions: &HashMap<String, Option<Version>>,
    canary: bool,
) -> Result<String> {
    let mut manifest: Value =
        serde_json::from_str(original).map_err(|source| ManifestError::ParseFailed {
            path: path.to_string(),
            source,
        })?;
    let root = manifest
        .as_object_mut()
        .ok_or_else(|| ManifestError::NotAnObject {
            path: path.to_string(),
        })?;

    root.insert(
        "version".to_string(),
        Value::String(new_version.to_string()),
    );

    for field in REWRITTEN_DEPENDENCY_FIELDS {
        let Some(block) = root.get_mut(field).and_then(Value::as_object_mut) else {
            continue;
        };
        for (dependency, range) in block.iter_mut() {
            let Some(Some(version)) = package_versions.get(dependency) else {
                continue;
            };
            let prefix = range_prefix(range.as_str().unwrap_or_default(), canary);
            *range = Value::String(format!("{prefix}{version}"));
        }
    }

    Ok(format::render_manifest(&manifest, original)?)
}

/// Range operator to keep when re-pinning a dependency. Canary versions are
/// only ever useful as exact pins.
fn range_prefix(existing_range: &str, canary: bool) -> &'static str {
    if canary {
        return "";
    }
    match existing_range.chars().next() {
        Some('^') => "^",
        Some('~') => "~",
        _ => "",
    }
}
