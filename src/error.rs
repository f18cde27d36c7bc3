//! Error types for monopub operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for monopub operations
pub type Result<T> = std::result::Result<T, PublishError>;

/// Main error type for all monopub operations
#[derive(Error, Debug)]
pub enum PublishError {
    /// Manifest parsing and rewriting errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// File store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Registry interaction errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Manifest-specific errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest is not valid JSON
    #[error("Failed to parse manifest at {path}: {source}")]
    ParseFailed {
        /// Repo-relative manifest path
        path: String,
        /// Parsing error
        #[source]
        source: serde_json::Error,
    },

    /// Manifest root is not a JSON object
    #[error("Manifest at {path} is not a JSON object")]
    NotAnObject {
        /// Repo-relative manifest path
        path: String,
    },

    /// Manifest is missing a usable package name or is marked to be skipped
    #[error("Manifest at {path} is not a publishable package: {reason}")]
    NotPublishable {
        /// Repo-relative manifest path
        path: String,
        /// Reason for the error
        reason: String,
    },
}

/// File store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read a repo-relative file
    #[error("Failed to read {path} under {root}: {source}")]
    ReadFailed {
        /// Repository root
        root: PathBuf,
        /// Repo-relative file path
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a repo-relative file
    #[error("Failed to write {path} under {root}: {source}")]
    WriteFailed {
        /// Repository root
        root: PathBuf,
        /// Repo-relative file path
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Registry interaction errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// HTTP client construction failed
    #[error("Failed to build the registry HTTP client: {source}")]
    ClientBuildFailed {
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Registry endpoint path could not be joined onto the base URL
    #[error("Invalid registry URL path '{path}': {source}")]
    InvalidPath {
        /// Relative endpoint path
        path: String,
        /// URL parsing error
        #[source]
        source: url::ParseError,
    },

    /// HTTP request to the registry failed
    #[error("Registry request failed for {url}: {source}")]
    RequestFailed {
        /// Requested URL
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// Registry returned an unexpected HTTP status
    #[error("Registry returned HTTP {status} for {url}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Registry response body could not be decoded
    #[error("Failed to decode registry response from {url}: {source}")]
    DecodeFailed {
        /// Requested URL
        url: String,
        /// Decoding error
        #[source]
        source: reqwest::Error,
    },

    /// The npm executable could not be located
    #[error("Could not locate the npm executable: {source}")]
    NpmNotFound {
        /// Lookup error
        #[source]
        source: which::Error,
    },

    /// Failed to spawn the npm process
    #[error("Failed to run npm for {path}: {source}")]
    SpawnFailed {
        /// Repo-relative manifest path being published
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// npm publish exited with a failure
    #[error("npm publish failed for {path}: {reason}")]
    PublishFailed {
        /// Repo-relative manifest path being published
        path: String,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl PublishError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PublishError::Registry(RegistryError::NpmNotFound { .. }) => vec![
                "Install npm (it ships with Node.js): https://nodejs.org".to_string(),
                "Ensure the npm executable is on PATH for this shell".to_string(),
            ],
            PublishError::Registry(RegistryError::UnexpectedStatus { status: 401, .. })
            | PublishError::Registry(RegistryError::UnexpectedStatus { status: 403, .. }) => vec![
                "Set NPM_TOKEN to a token with publish permissions".to_string(),
                "Or run 'npm login' so ~/.npmrc carries an _authToken entry".to_string(),
            ],
            PublishError::Registry(RegistryError::RequestFailed { .. }) => vec![
                "Check network connectivity to the registry".to_string(),
                "Verify the --registry URL is reachable".to_string(),
            ],
            PublishError::Manifest(ManifestError::ParseFailed { .. }) => vec![
                "Check the package.json is valid JSON (no trailing commas or comments)"
                    .to_string(),
            ],
            PublishError::Manifest(ManifestError::NotPublishable { .. }) => vec![
                "Ensure the manifest has a string \"name\" field".to_string(),
                "Remove any ignore marker if the package should be published".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PublishError::Manifest(ManifestError::NotAnObject { .. })
                | PublishError::Manifest(ManifestError::NotPublishable { .. })
                | PublishError::Cli(CliError::InvalidArguments { .. })
        )
    }
}
