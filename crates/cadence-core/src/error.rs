//! Core error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Git error.
    #[error("git error: {0}")]
    Git(#[from] cadence_git::GitError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] cadence_config::ConfigError),

    /// Version parsing error.
    #[error("version error: {0}")]
    Version(#[from] VersionError),

    /// Release host or text generation failure.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A package manifest next to a published changelog could not be read.
    #[error("malformed manifest {}: {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    /// The monorepo manifest could not be read or updated.
    #[error("invalid monorepo manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    /// Package name does not match `@scope/name`.
    #[error("invalid package name: {0} (expected @scope/name, lowercase alphanumeric and hyphens)")]
    InvalidPackageName(String),

    /// Package version is not a valid semantic version.
    #[error("invalid version for {name}: {version}")]
    InvalidPackageVersion { name: String, version: String },

    /// The published packages list is not a JSON array of `{name, version}`.
    #[error("invalid published packages list: {0}")]
    InvalidPackageList(String),

    /// A required handoff file is missing.
    #[error("required handoff file not found: {}", .0.display())]
    MissingHandoff(PathBuf),

    /// A handoff file holds an unexpected value.
    #[error("invalid handoff file {}: {reason}", path.display())]
    InvalidHandoff { path: PathBuf, reason: String },

    /// A changeset declares an unknown bump intent.
    #[error("invalid changeset {}: {reason}", path.display())]
    InvalidChangeset { path: PathBuf, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Semantic version parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Empty input or fewer than three dot-separated components.
    #[error("invalid version format: {0:?}")]
    InvalidFormat(String),

    /// A numeric component is not an integer.
    #[error("invalid version components: {0:?}")]
    InvalidComponents(String),

    /// A numeric component is negative.
    #[error("version components must be non-negative: {0:?}")]
    NegativeValue(String),
}

/// Errors reported by the release host and text generation collaborators.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service answered 429.
    #[error("rate limited")]
    RateLimited,

    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// An expected condition that a step handles locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// The tag already exists locally.
    TagExists(String),
    /// The tag push failed but the tag is present on the remote.
    RemoteTagExists(String),
    /// A release already exists for the tag.
    ReleaseExists(String),
    /// The package has no previous tag.
    FirstRelease(String),
    /// The monorepo bump commit for this version is already `HEAD`.
    AlreadyBumped(String),
    /// Text generation was skipped or failed.
    EnrichmentUnavailable(String),
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagExists(tag) => write!(f, "tag {tag} already exists locally"),
            Self::RemoteTagExists(tag) => write!(f, "tag {tag} already exists on remote"),
            Self::ReleaseExists(tag) => write!(f, "release {tag} already exists"),
            Self::FirstRelease(name) => write!(f, "no previous release of {name}"),
            Self::AlreadyBumped(version) => write!(f, "monorepo already bumped to v{version}"),
            Self::EnrichmentUnavailable(reason) => write!(f, "enrichment unavailable: {reason}"),
        }
    }
}

/// Outcome of a single idempotent step.
#[derive(Debug, Error)]
pub enum StepError {
    /// Expected condition; the pipeline continues.
    #[error("{0}")]
    Recoverable(Recovery),

    /// Unrecovered failure; the pipeline stops.
    #[error(transparent)]
    Fatal(#[from] CoreError),
}

impl From<cadence_git::GitError> for StepError {
    fn from(err: cadence_git::GitError) -> Self {
        Self::Fatal(err.into())
    }
}

impl From<RemoteError> for StepError {
    fn from(err: RemoteError) -> Self {
        Self::Fatal(err.into())
    }
}

/// Result type for idempotent steps.
pub type StepResult<T> = Result<T, StepError>;
