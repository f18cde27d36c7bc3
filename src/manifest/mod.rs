//! Package manifest model, discovery helpers, and publish-scoped rewriting.
//!
//! A manifest is a `package.json` file inside a monorepo. Parsing validates
//! shape once and produces [`PackageManifest`]; everything downstream works
//! with that struct instead of re-inspecting JSON.

mod format;
mod rewrite;

pub use format::{detect_indent, detect_newline, render_manifest};
pub use rewrite::with_rewritten_manifest;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::Result;

/// Manifest keys that mark a package as excluded from publishing.
const IGNORE_MARKER: &str = "@rollingversions/ignore";
const TOOL_CONFIG_KEY: &str = "@rollingversions";

/// Registry access level requested by a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishConfigAccess {
    /// World-readable package
    Public,
    /// Scoped package restricted to its org
    Restricted,
}

impl fmt::Display for PublishConfigAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishConfigAccess::Public => write!(f, "public"),
            PublishConfigAccess::Restricted => write!(f, "restricted"),
        }
    }
}

/// One publishable package discovered from a manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    /// Name the package publishes under
    pub package_name: String,
    /// Repo-relative path of the manifest file
    pub path: String,
    /// Access level the registry should apply
    pub publish_config_access: PublishConfigAccess,
    /// True when the manifest opts out of publishing via `"private": true`
    pub not_to_be_published: bool,
}

/// Dependency names extracted from one manifest, grouped by how consumers
/// need them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDependencies {
    /// Names from `dependencies` and `peerDependencies`
    pub required: BTreeSet<String>,
    /// Names from `optionalDependencies`
    pub optional: BTreeSet<String>,
    /// Names from `devDependencies`
    pub development: BTreeSet<String>,
}

/// Check whether a repo-relative path names a package manifest.
///
/// Paths use forward slashes regardless of platform.
pub fn looks_like_manifest_path(filename: &str) -> bool {
    filename == "package.json" || filename.ends_with("/package.json")
}

/// Parse a manifest into a [`PackageManifest`].
///
/// Returns `None` for files that are not publishable packages: invalid JSON,
/// a missing or non-string `name`, or an ignore marker. Markers follow
/// JavaScript truthiness, so `"@rollingversions/ignore": 0` does not ignore
/// the package but `"yes"` does.
pub fn parse_manifest(path: &str, content: &str) -> Option<PackageManifest> {
    let manifest: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(err) => {
            log::debug!("Skipping {path}: not valid JSON ({err})");
            return None;
        }
    };
    let root = manifest.as_object()?;
    let name = root.get("name")?.as_str()?;

    if is_truthy(root.get(IGNORE_MARKER)) {
        log::debug!("Skipping {path}: marked ignored");
        return None;
    }
    if let Some(tool_config) = root.get(TOOL_CONFIG_KEY).and_then(Value::as_object)
        && is_truthy(tool_config.get("ignore"))
    {
        log::debug!("Skipping {path}: marked ignored");
        return None;
    }

    Some(PackageManifest {
        package_name: name.to_string(),
        path: path.to_string(),
        publish_config_access: access_for(name, root),
        not_to_be_published: root.get("private") == Some(&Value::Bool(true)),
    })
}

/// Extract grouped dependency names from a manifest.
///
/// Missing or malformed dependency blocks contribute nothing; a manifest
/// that is not valid JSON is an error.
pub fn extract_dependencies(content: &str) -> Result<PackageDependencies> {
    let manifest: Value = serde_json::from_str(content)?;
    let mut dependencies = PackageDependencies::default();
    collect_keys(&manifest, "dependencies", &mut dependencies.required);
    collect_keys(&manifest, "peerDependencies", &mut dependencies.required);
    collect_keys(&manifest, "optionalDependencies", &mut dependencies.optional);
    collect_keys(&manifest, "devDependencies", &mut dependencies.development);
    Ok(dependencies)
}

/// Scoped packages default to restricted unless `publishConfig.access` says
/// `"public"` verbatim; unscoped packages are always public.
fn access_for(name: &str, root: &serde_json::Map<String, Value>) -> PublishConfigAccess {
    if !name.starts_with('@') {
        return PublishConfigAccess::Public;
    }
    let configured = root
        .get("publishConfig")
        .and_then(Value::as_object)
        .and_then(|publish_config| publish_config.get("access"))
        .and_then(Value::as_str);
    if configured == Some("public") {
        PublishConfigAccess::Public
    } else {
        PublishConfigAccess::Restricted
    }
}

fn collect_keys(manifest: &Value, field: &str, into: &mut BTreeSet<String>) {
    if let Some(block) = manifest.get(field).and_then(Value::as_object) {
        into.extend(block.keys().cloned());
    }
}

/// JavaScript truthiness for marker values.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Bool(true)) => true,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_manifest_path() {
        assert!(looks_like_manifest_path("package.json"));
        assert!(looks_like_manifest_path("packages/core/package.json"));
        assert!(!looks_like_manifest_path("packages/core/package.json5"));
        assert!(!looks_like_manifest_path("notpackage.json"));
        assert!(!looks_like_manifest_path("package.json/README.md"));
    }

    #[test]
    fn test_parse_manifest_basic() {
        let pkg = parse_manifest(
            "packages/core/package.json",
            r#"{"name": "core", "version": "1.0.0"}"#,
        )
        .unwrap();
        assert_eq!(pkg.package_name, "core");
        assert_eq!(pkg.path, "packages/core/package.json");
        assert_eq!(pkg.publish_config_access, PublishConfigAccess::Public);
        assert!(!pkg.not_to_be_published);
    }

    #[test]
    fn test_parse_manifest_rejects_invalid_json_and_missing_name() {
        assert!(parse_manifest("package.json", "{not json").is_none());
        assert!(parse_manifest("package.json", r#"{"version": "1.0.0"}"#).is_none());
        assert!(parse_manifest("package.json", r#"{"name": 42}"#).is_none());
        assert!(parse_manifest("package.json", r#"["name"]"#).is_none());
    }

    #[test]
    fn test_parse_manifest_ignore_markers_use_truthiness() {
        let ignored = r#"{"name": "a", "@rollingversions/ignore": true}"#;
        assert!(parse_manifest("package.json", ignored).is_none());

        let ignored_string = r#"{"name": "a", "@rollingversions/ignore": "yes"}"#;
        assert!(parse_manifest("package.json", ignored_string).is_none());

        let falsy_marker = r#"{"name": "a", "@rollingversions/ignore": 0}"#;
        assert!(parse_manifest("package.json", falsy_marker).is_some());

        let nested = r#"{"name": "a", "@rollingversions": {"ignore": true}}"#;
        assert!(parse_manifest("package.json", nested).is_none());

        let nested_false = r#"{"name": "a", "@rollingversions": {"ignore": false}}"#;
        assert!(parse_manifest("package.json", nested_false).is_some());

        let non_object_config = r#"{"name": "a", "@rollingversions": "ignore"}"#;
        assert!(parse_manifest("package.json", non_object_config).is_some());
    }

    #[test]
    fn test_parse_manifest_access_levels() {
        let scoped = parse_manifest("package.json", r#"{"name": "@acme/core"}"#).unwrap();
        assert_eq!(scoped.publish_config_access, PublishConfigAccess::Restricted);

        let public = parse_manifest(
            "package.json",
            r#"{"name": "@acme/core", "publishConfig": {"access": "public"}}"#,
        )
        .unwrap();
        assert_eq!(public.publish_config_access, PublishConfigAccess::Public);

        let other = parse_manifest(
            "package.json",
            r#"{"name": "@acme/core", "publishConfig": {"access": "restricted"}}"#,
        )
        .unwrap();
        assert_eq!(other.publish_config_access, PublishConfigAccess::Restricted);

        let unscoped = parse_manifest(
            "package.json",
            r#"{"name": "core", "publishConfig": {"access": "restricted"}}"#,
        )
        .unwrap();
        assert_eq!(unscoped.publish_config_access, PublishConfigAccess::Public);
    }

    #[test]
    fn test_parse_manifest_private_flag_is_strict() {
        let private = parse_manifest("package.json", r#"{"name": "a", "private": true}"#).unwrap();
        assert!(private.not_to_be_published);

        let stringly = parse_manifest("package.json", r#"{"name": "a", "private": "true"}"#)
            .unwrap();
        assert!(!stringly.not_to_be_published);

        let absent = parse_manifest("package.json", r#"{"name": "a"}"#).unwrap();
        assert!(!absent.not_to_be_published);
    }

    #[test]
    fn test_extract_dependencies_groups() {
        let manifest = r#"{
            "name": "a",
            "dependencies": {"left-pad": "^1.0.0", "shared": "1.0.0"},
            "peerDependencies": {"react": ">=16"},
            "optionalDependencies": {"fsevents": "^2.0.0"},
            "devDependencies": {"jest": "^29.0.0"}
        }"#;
        let deps = extract_dependencies(manifest).unwrap();
        assert_eq!(
            deps.required,
            ["left-pad", "shared", "react"]
                .into_iter()
                .map(String::from)
                .collect()
        );
        assert_eq!(deps.optional, ["fsevents".to_string()].into_iter().collect());
        assert_eq!(deps.development, ["jest".to_string()].into_iter().collect());
    }

    #[test]
    fn test_extract_dependencies_tolerates_missing_and_malformed_blocks() {
        let deps = extract_dependencies(r#"{"name": "a", "dependencies": "oops"}"#).unwrap();
        assert!(deps.required.is_empty());
        assert!(deps.optional.is_empty());
        assert!(deps.development.is_empty());
    }

    #[test]
    fn test_extract_dependencies_propagates_parse_errors() {
        assert!(extract_dependencies("{broken").is_err());
    }
}
