//! Pre-publish authorization and publish execution.
//!
//! [`prepublish`] answers "will this publish be accepted?" without changing
//! anything on the registry: it checks authentication, 2FA mode, permissions,
//! and version collisions, then runs a registry dry run under the rewritten
//! manifest. [`publish`] performs the real publish under the same rewrite.

use semver::Version;
use std::collections::HashMap;

use crate::PublishConfig;
use crate::error::Result;
use crate::manifest::{PackageManifest, with_rewritten_manifest};
use crate::registry::{AuthState, PublishOpts, Registry};
use crate::store::FileStore;

/// Terminal outcome of the pre-publish checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrePublishResult {
    /// Every check passed and the registry accepted a dry run
    Ok,
    /// A check failed; the publish would be rejected
    Failed {
        /// Display-ready explanation of the failure
        reason: String,
    },
}

impl PrePublishResult {
    /// True when publishing may proceed
    pub fn is_ok(&self) -> bool {
        matches!(self, PrePublishResult::Ok)
    }

    /// The failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            PrePublishResult::Ok => None,
            PrePublishResult::Failed { reason } => Some(reason),
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        PrePublishResult::Failed {
            reason: reason.into(),
        }
    }
}

/// Version of `pkg` currently on the registry, or `None` for packages that
/// are private or have never been published.
pub async fn registry_version<R: Registry>(
    registry: &R,
    pkg: &PackageManifest,
) -> Result<Option<String>> {
    if pkg.not_to_be_published {
        return Ok(None);
    }
    registry.published_version(&pkg.package_name).await
}

/// Run every check that could cause a publish of `pkg` at `new_version` to
/// be rejected.
///
/// Business rejections come back as [`PrePublishResult::Failed`]; transport
/// and registry protocol failures are errors.
pub async fn prepublish<R, S>(
    config: &PublishConfig,
    pkg: &PackageManifest,
    new_version: &Version,
    package_versions: &HashMap<String, Option<Version>>,
    registry: &R,
    store: &S,
) -> Result<PrePublishResult>
where
    R: Registry,
    S: FileStore,
{
    let (auth, owners, versions) = tokio::try_join!(
        registry.profile(),
        registry.owners(&pkg.package_name),
        registry.versions(&pkg.package_name),
    )?;

    let profile = match auth {
        AuthState::Authenticated { profile } => profile,
        AuthState::Anonymous { message } => {
            return Ok(PrePublishResult::failed(format!(
                "Could not authenticate to npm: {message}"
            )));
        }
    };
    log::debug!("Authenticated to npm as @{}", profile.name);

    if profile.tfa_on_publish {
        return Ok(PrePublishResult::failed(
            "This user requires 2fa on publish to npm, which is not supported",
        ));
    }

    match (owners, versions) {
        (Some(owners), Some(versions)) => {
            if !owners.iter().any(|owner| owner.name == profile.name) {
                return Ok(PrePublishResult::failed(format!(
                    "The user @{} is not listed as a maintainer of {} on npm",
                    profile.name, pkg.package_name
                )));
            }
            if versions.contains(&new_version.to_string()) {
                return Ok(PrePublishResult::failed(format!(
                    "{} already has a version {new_version} on npm",
                    pkg.package_name
                )));
            }
        }
        // The registry has never seen this package. First publishes into an
        // org scope are gated on org membership instead of the maintainer
        // list, unless the scope is the user's own.
        _ => {
            if let Some(org) = scoped_org(&pkg.package_name)
                && org != profile.name
            {
                let roster = registry.org_roster(org).await?;
                if !roster.contains_key(&profile.name) {
                    return Ok(PrePublishResult::failed(format!(
                        "@{} does not appear to have permission to publish new packages \
                         to @{org} on npm",
                        profile.name
                    )));
                }
            }
        }
    }

    with_rewritten_manifest(config, pkg, new_version, package_versions, store, || async move {
        registry
            .publish(
                &config.dirname,
                &pkg.path,
                PublishOpts {
                    dry_run: true,
                    canary: config.canary.is_some(),
                },
            )
            .await
    })
    .await?;

    Ok(PrePublishResult::Ok)
}

/// Publish `pkg` at `new_version` under a rewritten manifest.
///
/// Callers are expected to have run [`prepublish`] first; this performs no
/// checks of its own beyond what the registry enforces.
pub async fn publish<R, S>(
    config: &PublishConfig,
    pkg: &PackageManifest,
    new_version: &Version,
    package_versions: &HashMap<String, Option<Version>>,
    registry: &R,
    store: &S,
) -> Result<()>
where
    R: Registry,
    S: FileStore,
{
    log::info!(
        "Publishing {} version {new_version} (dry run: {})",
        pkg.package_name,
        config.dry_run
    );
    with_rewritten_manifest(config, pkg, new_version, package_versions, store, || async move {
        registry
            .publish(
                &config.dirname,
                &pkg.path,
                PublishOpts {
                    dry_run: config.dry_run,
                    canary: config.canary.is_some(),
                },
            )
            .await
    })
    .await
}

/// Org component of a scoped package name: `@org/name` yields `org`.
fn scoped_org(package_name: &str) -> Option<&str> {
    package_name.strip_prefix('@')?.split('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_org() {
        assert_eq!(scoped_org("@acme/widget"), Some("acme"));
        assert_eq!(scoped_org("widget"), None);
        assert_eq!(scoped_org("@acme"), Some("acme"));
    }

    #[test]
    fn test_prepublish_result_accessors() {
        assert!(PrePublishResult::Ok.is_ok());
        assert_eq!(PrePublishResult::Ok.reason(), None);

        let failed = PrePublishResult::failed("nope");
        assert!(!failed.is_ok());
        assert_eq!(failed.reason(), Some("nope"));
    }
}
