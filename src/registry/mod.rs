//! Registry collaborator interface.
//!
//! The publish flow talks to an abstract [`Registry`]; [`NpmRegistry`] is the
//! production implementation over the npm JSON API and the npm CLI.

mod npm;

pub use npm::{DEFAULT_REGISTRY_URL, NpmRegistry, NpmRegistryConfig};

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::Path;

use crate::error::Result;

/// Authentication state reported by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Requests carry a valid identity
    Authenticated {
        /// The acting profile
        profile: Profile,
    },
    /// No usable identity; `message` says why
    Anonymous {
        /// Human-readable explanation
        message: String,
    },
}

/// The acting identity on the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Registry username
    pub name: String,
    /// True when the account enforces a second factor on every publish
    pub tfa_on_publish: bool,
}

/// One maintainer entry from a package's metadata
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Owner {
    /// Maintainer username
    pub name: String,
    /// Maintainer email, when the registry exposes one
    #[serde(default)]
    pub email: Option<String>,
}

/// Org membership map: username to role
pub type OrgRoster = HashMap<String, String>;

/// Options for a single publish invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOpts {
    /// Ask the registry to validate without persisting a new version
    pub dry_run: bool,
    /// Tag the release as a canary instead of latest
    pub canary: bool,
}

/// Operations the publish flow needs from a package registry.
pub trait Registry {
    /// Identify the acting user.
    fn profile(&self) -> impl Future<Output = Result<AuthState>>;

    /// Current maintainers of a package, or `None` if the registry has
    /// never seen it.
    fn owners(&self, package_name: &str) -> impl Future<Output = Result<Option<Vec<Owner>>>>;

    /// Every published version of a package, or `None` if the registry has
    /// never seen it.
    fn versions(
        &self,
        package_name: &str,
    ) -> impl Future<Output = Result<Option<HashSet<String>>>>;

    /// Membership roster of an org. Unknown orgs have an empty roster.
    fn org_roster(&self, org: &str) -> impl Future<Output = Result<OrgRoster>>;

    /// Version currently tagged `latest`, or `None` if never published.
    fn published_version(
        &self,
        package_name: &str,
    ) -> impl Future<Output = Result<Option<String>>>;

    /// Publish the package whose manifest sits at `path` under `root`.
    fn publish(
        &self,
        root: &Path,
        path: &str,
        opts: PublishOpts,
    ) -> impl Future<Output = Result<()>>;
}
