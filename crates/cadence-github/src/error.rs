//! GitHub client error types.

use cadence_core::RemoteError;
use thiserror::Error;

/// Result type for GitHub client operations.
pub type GithubResult<T> = Result<T, GithubError>;

/// Errors from the GitHub REST and Models clients.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Repository identifier is not `owner/repo`.
    #[error("invalid repository: {0} (expected owner/repo)")]
    InvalidRepository(String),

    /// A base URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or timed out.
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered 429.
    #[error("rate limited by {0}")]
    RateLimited(String),

    /// The service answered with an unexpected status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

impl From<GithubError> for RemoteError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::RateLimited(_) => Self::RateLimited,
            GithubError::Status { status, body, .. } => Self::Status { status, body },
            GithubError::InvalidResponse { reason, .. } => Self::InvalidResponse(reason),
            GithubError::Request { url, source } => Self::Request(format!("{url}: {source}")),
            other => Self::Request(other.to_string()),
        }
    }
}
