//! # monopub
//!
//! Safe npm publishing for monorepo packages.
//!
//! Monorepo manifests are written for development: the `version` field lags
//! the release plan and sibling dependencies point at stale ranges. This
//! crate publishes one package at a time by temporarily rewriting its
//! manifest (new version, re-pinned sibling ranges, original formatting),
//! running the publish, and always restoring the original bytes.
//!
//! ## Features
//!
//! - **Scoped rewrites**: The on-disk manifest is only changed for the
//!   duration of a publish, even when the publish fails
//! - **Format preservation**: Indentation, line endings, and key order
//!   survive the rewrite, so nothing else shows up in `git status`
//! - **Pre-publish checks**: Auth, 2FA mode, maintainer and org permission,
//!   and version collisions are all verified before anything is published
//! - **Registry dry runs**: Every check ends with `npm publish --dry-run`
//!   under the rewritten manifest
//!
//! ## Usage
//!
//! ```bash
//! monopub check packages/core/package.json 1.2.0
//! monopub publish packages/core/package.json 1.2.0 --set @acme/utils=1.2.0
//! monopub info packages/core/package.json
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod error;
pub mod manifest;
pub mod publish;
pub mod registry;
pub mod store;

// Re-export main types for public API
pub use cli::Args;
pub use error::{CliError, PublishError, Result};
pub use manifest::{
    PackageDependencies, PackageManifest, PublishConfigAccess, extract_dependencies,
    looks_like_manifest_path, parse_manifest, with_rewritten_manifest,
};
pub use publish::{PrePublishResult, prepublish, registry_version};
pub use registry::{NpmRegistry, NpmRegistryConfig, Registry};
pub use store::{FileStore, FsFileStore};

use std::path::PathBuf;

/// Per-invocation publish settings shared by every rewrite-scoped operation
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Repository root that manifest paths are relative to
    pub dirname: PathBuf,
    /// Ask the registry to validate without persisting a new version
    pub dry_run: bool,
    /// Canary tag for this release; `Some` puts the whole run in canary mode
    pub canary: Option<String>,
}
