//! Shared setup for the publish-flow commands.

use semver::Version;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::PublishConfig;
use crate::cli::args::parse_version_override;
use crate::cli::{Args, RuntimeConfig};
use crate::error::{CliError, ManifestError, Result};
use crate::manifest::{self, PackageManifest};
use crate::registry::{NpmRegistry, NpmRegistryConfig};
use crate::store::{FileStore, FsFileStore};

/// Everything a publish-flow command needs, derived from CLI arguments.
pub(super) struct PublishContext {
    /// Per-invocation publish settings
    pub config: PublishConfig,
    /// Registry client
    pub registry: NpmRegistry,
    /// Repository file access
    pub store: FsFileStore,
    /// The package being published
    pub pkg: PackageManifest,
    /// New versions of sibling packages, keyed by package name
    pub package_versions: HashMap<String, Option<Version>>,
}

/// Read and parse the target manifest, resolve auth, and assemble the
/// collaborators for one command invocation.
pub(super) async fn load_context(
    args: &Args,
    runtime: &RuntimeConfig,
    overrides: &[String],
    canary: Option<String>,
    dry_run: bool,
) -> Result<PublishContext> {
    let path = args.command.manifest_path();
    let root = resolve_root(&args.root);
    runtime.verbose_println(&format!("Repository root: {}", root.display()));

    let store = FsFileStore;
    let content = store.read_file(&root, path).await?;
    let pkg = manifest::parse_manifest(path, &content).ok_or_else(|| {
        ManifestError::NotPublishable {
            path: path.to_string(),
            reason: "it has invalid JSON, no string \"name\", or an ignore marker".to_string(),
        }
    })?;

    let mut package_versions = HashMap::new();
    for spec in overrides {
        let (name, version) =
            parse_version_override(spec).map_err(|reason| CliError::InvalidArguments { reason })?;
        package_versions.insert(name, version);
    }

    let token = NpmRegistryConfig::resolve_token(&args.registry, args.token.clone());
    if token.is_none() {
        runtime.verbose_println("No npm token found; registry requests will be anonymous");
    }
    let registry = NpmRegistry::new(NpmRegistryConfig::new(args.registry.clone(), token))?;

    Ok(PublishContext {
        config: PublishConfig {
            dirname: root,
            dry_run,
            canary,
        },
        registry,
        store,
        pkg,
        package_versions,
    })
}

/// Canonicalize the repository root when possible so npm runs against real
/// paths even when the CLI was handed a relative one.
fn resolve_root(root: &Path) -> PathBuf {
    std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}
