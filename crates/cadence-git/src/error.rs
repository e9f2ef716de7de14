//! Git error types.

use thiserror::Error;

/// Git-related errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository.
    #[error("not a git repository: {0}")]
    NotARepo(std::path::PathBuf),

    /// Remote not configured.
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; cannot determine the branch to push")]
    DetachedHead,

    /// Tag already exists locally.
    #[error("tag already exists: {0}")]
    TagExists(String),

    /// The remote refused an update.
    #[error("push of {refspec} rejected: {reason}")]
    PushRejected { refspec: String, reason: String },

    /// Git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;
