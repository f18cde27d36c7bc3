//! Command line argument parsing and validation.

use clap::{Parser, Subcommand};
use semver::Version;
use std::path::PathBuf;
use url::Url;

use crate::registry::DEFAULT_REGISTRY_URL;

/// Safe npm publishing for monorepo packages
#[derive(Parser, Debug)]
#[command(
    name = "monopub",
    version,
    about = "Safe npm publishing for monorepo packages",
    long_about = "Publish one package out of a monorepo, with pre-flight checks.

Usage:
  monopub check packages/core/package.json 1.2.0
  monopub publish packages/core/package.json 1.2.0 --set @acme/utils=1.2.0
  monopub info packages/core/package.json"
)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Repository root that manifest paths are relative to
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Registry base URL
    #[arg(long, global = true, default_value = DEFAULT_REGISTRY_URL, value_name = "URL")]
    pub registry: Url,

    /// Registry auth token (falls back to NPM_CONFIG_TOKEN and ~/.npmrc)
    #[arg(long, global = true, env = "NPM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Show detailed progress output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every pre-publish check plus a registry dry run
    Check {
        /// Repo-relative path to the package manifest
        #[arg(value_name = "MANIFEST")]
        path: String,

        /// Version the package is about to be published at
        #[arg(value_name = "VERSION")]
        new_version: Version,

        /// Sibling package version as a name=version pair (repeatable)
        #[arg(long = "set", value_name = "NAME=VERSION")]
        set_versions: Vec<String>,

        /// Treat this as a canary release: dependency ranges become exact pins
        #[arg(long, value_name = "TAG")]
        canary: Option<String>,
    },

    /// Run the checks, then publish the package
    Publish {
        /// Repo-relative path to the package manifest
        #[arg(value_name = "MANIFEST")]
        path: String,

        /// Version to publish
        #[arg(value_name = "VERSION")]
        new_version: Version,

        /// Sibling package version as a name=version pair (repeatable)
        #[arg(long = "set", value_name = "NAME=VERSION")]
        set_versions: Vec<String>,

        /// Treat this as a canary release: dependency ranges become exact pins
        #[arg(long, value_name = "TAG")]
        canary: Option<String>,

        /// Go through the whole flow without persisting a new version
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the parsed manifest and the registry's current version
    Info {
        /// Repo-relative path to the package manifest
        #[arg(value_name = "MANIFEST")]
        path: String,
    },
}

impl Command {
    /// Command name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Check { .. } => "check",
            Command::Publish { .. } => "publish",
            Command::Info { .. } => "info",
        }
    }

    /// Manifest path targeted by this command
    pub fn manifest_path(&self) -> &str {
        match self {
            Command::Check { path, .. }
            | Command::Publish { path, .. }
            | Command::Info { path, .. } => path,
        }
    }

    fn version_overrides(&self) -> &[String] {
        match self {
            Command::Check { set_versions, .. } | Command::Publish { set_versions, .. } => {
                set_versions
            }
            Command::Info { .. } => &[],
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet are mutually exclusive".to_string());
        }

        let path = self.command.manifest_path();
        if !crate::manifest::looks_like_manifest_path(path) {
            return Err(format!("'{path}' does not name a package.json file"));
        }

        for spec in self.command.version_overrides() {
            parse_version_override(spec)?;
        }

        Ok(())
    }
}

/// Parse one `name=version` sibling override. An empty version marks the
/// sibling as present but not re-versioned in this release.
pub(super) fn parse_version_override(
    spec: &str,
) -> std::result::Result<(String, Option<Version>), String> {
    let Some((name, version)) = spec.split_once('=') else {
        return Err(format!("Invalid override '{spec}': expected NAME=VERSION"));
    };
    if name.is_empty() {
        return Err(format!("Invalid override '{spec}': empty package name"));
    }
    if version.is_empty() {
        return Ok((name.to_string(), None));
    }
    match Version::parse(version) {
        Ok(version) => Ok((name.to_string(), Some(version))),
        Err(err) => Err(format!("Invalid version in override '{spec}': {err}")),
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration from parsed arguments
    pub fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print info message
    pub fn info_println(&self, message: &str) {
        let _ = self.output.info(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}
