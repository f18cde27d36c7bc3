//! npm registry adapter.
//!
//! Reads go through the registry JSON API with an optional bearer token;
//! publishing shells out to the npm CLI so that packing, lifecycle scripts,
//! and auth behave exactly as they do for a manual `npm publish`.

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use url::Url;

use super::{AuthState, OrgRoster, Owner, Profile, PublishOpts, Registry};
use crate::error::{RegistryError, Result};

/// Default public registry endpoint
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org/";

/// Account mode that forces a one-time password on every publish
const TFA_MODE_AUTH_AND_WRITES: &str = "auth-and-writes";

/// Connection settings for [`NpmRegistry`]
#[derive(Debug, Clone)]
pub struct NpmRegistryConfig {
    /// Registry base URL, normalized to end with a slash
    pub registry_url: Url,
    /// Bearer token for authenticated endpoints
    pub token: Option<String>,
}

impl NpmRegistryConfig {
    /// Create a config, normalizing the base URL so endpoint joins append
    /// instead of replacing the final path segment.
    pub fn new(mut registry_url: Url, token: Option<String>) -> Self {
        if !registry_url.path().ends_with('/') {
            let path = format!("{}/", registry_url.path());
            registry_url.set_path(&path);
        }
        Self {
            registry_url,
            token,
        }
    }

    /// Resolve a token for `registry_url`: an explicit value wins, then the
    /// NPM_TOKEN and NPM_CONFIG_TOKEN environment variables, then the
    /// matching `_authToken` line in `~/.npmrc`.
    pub fn resolve_token(registry_url: &Url, explicit: Option<String>) -> Option<String> {
        if let Some(token) = explicit
            && !token.is_empty()
        {
            return Some(token);
        }
        for variable in ["NPM_TOKEN", "NPM_CONFIG_TOKEN"] {
            if let Ok(token) = std::env::var(variable)
                && !token.is_empty()
            {
                log::debug!("Using npm token from {variable}");
                return Some(token);
            }
        }
        let npmrc_path = dirs::home_dir()?.join(".npmrc");
        let npmrc = std::fs::read_to_string(&npmrc_path).ok()?;
        let token = npmrc_auth_token(&npmrc, registry_url);
        if token.is_some() {
            log::debug!("Using npm token from {}", npmrc_path.display());
        }
        token
    }
}

/// Production [`Registry`] backed by the npm JSON API and the npm CLI.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    http: reqwest::Client,
    config: NpmRegistryConfig,
}

impl NpmRegistry {
    /// Create a registry client.
    pub fn new(config: NpmRegistryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("monopub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| RegistryError::ClientBuildFailed { source })?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.config
            .registry_url
            .join(path)
            .map_err(|source| {
                RegistryError::InvalidPath {
                    path: path.to_string(),
                    source,
                }
                .into()
            })
    }

    /// GET an endpoint and decode the JSON body. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.endpoint(path)?;
        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        log::debug!("GET {url}");
        let response = request.send().await.map_err(|source| {
            RegistryError::RequestFailed {
                url: url.to_string(),
                source,
            }
        })?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RegistryError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }
        let body = response.json::<T>().await.map_err(|source| {
            RegistryError::DecodeFailed {
                url: url.to_string(),
                source,
            }
        })?;
        Ok(Some(body))
    }

    async fn fetch_packument(&self, package_name: &str) -> Result<Option<Packument>> {
        self.get_json(&escape_package_name(package_name)).await
    }
}

impl Registry for NpmRegistry {
    async fn profile(&self) -> Result<AuthState> {
        let Some(token) = &self.config.token else {
            return Ok(AuthState::Anonymous {
                message: "no auth token is configured for the registry".to_string(),
            });
        };
        let url = self.endpoint("-/npm/v1/user")?;
        log::debug!("GET {url}");
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| RegistryError::RequestFailed {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            let user: UserDoc = response.json().await.map_err(|source| {
                RegistryError::DecodeFailed {
                    url: url.to_string(),
                    source,
                }
            })?;
            return Ok(AuthState::Authenticated {
                profile: Profile {
                    tfa_on_publish: user.tfa_on_publish(),
                    name: user.name,
                },
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(AuthState::Anonymous {
                message: format!(
                    "the registry rejected the configured token (HTTP {})",
                    status.as_u16()
                ),
            });
        }
        Err(RegistryError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        }
        .into())
    }

    async fn owners(&self, package_name: &str) -> Result<Option<Vec<Owner>>> {
        Ok(self
            .fetch_packument(package_name)
            .await?
            .map(|packument| packument.maintainers))
    }

    async fn versions(&self, package_name: &str) -> Result<Option<HashSet<String>>> {
        Ok(self
            .fetch_packument(package_name)
            .await?
            .map(|packument| packument.versions.into_keys().collect()))
    }

    async fn org_roster(&self, org: &str) -> Result<OrgRoster> {
        let roster: Option<OrgRoster> = self.get_json(&format!("-/org/{org}/user")).await?;
        Ok(roster.unwrap_or_default())
    }

    async fn published_version(&self, package_name: &str) -> Result<Option<String>> {
        Ok(self
            .fetch_packument(package_name)
            .await?
            .and_then(|packument| packument.dist_tags.get("latest").cloned()))
    }

    async fn publish(&self, root: &Path, path: &str, opts: PublishOpts) -> Result<()> {
        let npm = which::which("npm")
            .map_err(|source| RegistryError::NpmNotFound { source })?;
        let package_dir = package_dir(root, path);

        let mut command = tokio::process::Command::new(npm);
        command
            .current_dir(&package_dir)
            .arg("publish")
            .arg("--registry")
            .arg(self.config.registry_url.as_str());
        if opts.dry_run {
            command.arg("--dry-run");
        }
        if opts.canary {
            command.args(["--tag", "canary"]);
        }

        log::info!(
            "Running npm publish in {} (dry run: {})",
            package_dir.display(),
            opts.dry_run
        );
        let output = command.output().await.map_err(|source| {
            RegistryError::SpawnFailed {
                path: path.to_string(),
                source,
            }
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RegistryError::PublishFailed {
                path: path.to_string(),
                reason: publish_failure_reason(&stderr),
            }
            .into());
        }
        Ok(())
    }
}

/// User document from `/-/npm/v1/user`
#[derive(Debug, Deserialize)]
struct UserDoc {
    name: String,
    /// Either absent, `false`, or an object carrying `mode`
    #[serde(default)]
    tfa: Option<serde_json::Value>,
}

impl UserDoc {
    fn tfa_on_publish(&self) -> bool {
        self.tfa
            .as_ref()
            .and_then(|tfa| tfa.get("mode"))
            .and_then(|mode| mode.as_str())
            == Some(TFA_MODE_AUTH_AND_WRITES)
    }
}

/// The slice of a packument this crate reads
#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(default)]
    maintainers: Vec<Owner>,
    #[serde(default)]
    versions: HashMap<String, IgnoredAny>,
    #[serde(default, rename = "dist-tags")]
    dist_tags: HashMap<String, String>,
}

/// Scoped names keep their `@` but escape the slash for the packument route.
fn escape_package_name(package_name: &str) -> String {
    package_name.replace('/', "%2F")
}

/// Directory containing the manifest at repo-relative `path`.
fn package_dir(root: &Path, path: &str) -> PathBuf {
    let mut dir = root.to_path_buf();
    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    dir.extend(segments);
    dir
}

/// Pull the `_authToken` entry matching `registry_url` out of npmrc text.
fn npmrc_auth_token(npmrc: &str, registry_url: &Url) -> Option<String> {
    let host = registry_url.host_str()?;
    for line in npmrc.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("//") else {
            continue;
        };
        let Some((scope, token)) = rest.split_once(":_authToken=") else {
            continue;
        };
        let scope = scope.trim_end_matches('/');
        let matches_host = scope == host
            || scope
                .strip_prefix(host)
                .is_some_and(|remainder| remainder.starts_with('/'));
        if matches_host {
            let token = token.trim().trim_matches('"');
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Condense npm CLI stderr into the lines that explain the failure.
fn publish_failure_reason(stderr: &str) -> String {
    let error_lines: Vec<&str> = stderr
        .lines()
        .filter(|line| line.contains("ERR!"))
        .collect();
    if error_lines.is_empty() {
        stderr
            .trim()
            .lines()
            .next_back()
            .unwrap_or("npm exited with a failure")
            .to_string()
    } else {
        error_lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_normalizes_base_url() {
        let config = NpmRegistryConfig::new(
            Url::parse("https://registry.example.com/npm").unwrap(),
            None,
        );
        assert_eq!(config.registry_url.as_str(), "https://registry.example.com/npm/");

        let already = NpmRegistryConfig::new(Url::parse(DEFAULT_REGISTRY_URL).unwrap(), None);
        assert_eq!(already.registry_url.as_str(), DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn test_escape_package_name() {
        assert_eq!(escape_package_name("lodash"), "lodash");
        assert_eq!(escape_package_name("@acme/widget"), "@acme%2Fwidget");
    }

    #[test]
    fn test_package_dir_strips_manifest_filename() {
        assert_eq!(
            package_dir(Path::new("/repo"), "packages/core/package.json"),
            Path::new("/repo/packages/core")
        );
        assert_eq!(
            package_dir(Path::new("/repo"), "package.json"),
            Path::new("/repo")
        );
    }

    #[test]
    fn test_npmrc_auth_token_matches_host() {
        let npmrc = "\
registry=https://registry.npmjs.org/
//registry.npmjs.org/:_authToken=npm_abc123
//other.example.com/:_authToken=npm_nope
";
        let url = Url::parse("https://registry.npmjs.org/").unwrap();
        assert_eq!(npmrc_auth_token(npmrc, &url), Some("npm_abc123".to_string()));

        let other = Url::parse("https://missing.example.com/").unwrap();
        assert_eq!(npmrc_auth_token(npmrc, &other), None);
    }

    #[test]
    fn test_npmrc_auth_token_with_path_and_quotes() {
        let npmrc = "//registry.example.com/npm/:_authToken=\"tok-1\"\n";
        let url = Url::parse("https://registry.example.com/npm/").unwrap();
        assert_eq!(npmrc_auth_token(npmrc, &url), Some("tok-1".to_string()));
    }

    #[test]
    fn test_user_doc_tfa_modes() {
        let enforced: UserDoc =
            serde_json::from_str(r#"{"name": "dev", "tfa": {"mode": "auth-and-writes"}}"#)
                .unwrap();
        assert!(enforced.tfa_on_publish());

        let auth_only: UserDoc =
            serde_json::from_str(r#"{"name": "dev", "tfa": {"mode": "auth-only"}}"#).unwrap();
        assert!(!auth_only.tfa_on_publish());

        let disabled: UserDoc = serde_json::from_str(r#"{"name": "dev", "tfa": false}"#).unwrap();
        assert!(!disabled.tfa_on_publish());

        let absent: UserDoc = serde_json::from_str(r#"{"name": "dev"}"#).unwrap();
        assert!(!absent.tfa_on_publish());
    }

    #[test]
    fn test_publish_failure_reason_prefers_err_lines() {
        let stderr = "\
npm notice package: widget@1.0.0
npm ERR! code E403
npm ERR! 403 Forbidden
";
        assert_eq!(
            publish_failure_reason(stderr),
            "npm ERR! code E403\nnpm ERR! 403 Forbidden"
        );
        assert_eq!(publish_failure_reason("something odd\n"), "something odd");
    }
}
