//! Remote collaborators consumed by the pipeline.

use crate::RemoteError;

/// A release to create on the release host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest<'a> {
    /// Tag the release is attached to.
    pub tag: &'a str,
    /// Release title.
    pub title: &'a str,
    /// Markdown notes.
    pub body: &'a str,
    /// Branch the tag is created from if missing.
    pub target: &'a str,
}

/// Release-hosting API.
#[allow(async_fn_in_trait)]
pub trait ReleaseHost {
    /// Returns whether a release exists for the tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be queried.
    async fn release_exists(&self, tag: &str) -> Result<bool, RemoteError>;

    /// Creates a release.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects or fails the request.
    async fn create_release(&self, request: &ReleaseRequest<'_>) -> Result<(), RemoteError>;

    /// Human-readable URL of the release for a tag.
    fn release_url(&self, tag: &str) -> String;
}

/// A system/user prompt pair with an output budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System prompt.
    pub system: String,
    /// User prompt.
    pub user: String,
    /// Maximum output tokens.
    pub max_tokens: u32,
}

/// External text-generation API.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    /// Generates text for a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::RateLimited`] on 429 and another error for any other
    /// failure. Callers do not retry.
    async fn generate(&self, prompt: &Prompt) -> Result<String, RemoteError>;
}
