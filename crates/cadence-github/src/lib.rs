//! GitHub collaborators for Cadence.
//!
//! [`GithubReleases`] talks to the Releases REST API and [`ModelsClient`] to a
//! chat completions endpoint. Both implement the remote traits of
//! `cadence-core`.

mod error;
mod models;
mod releases;
#[cfg(test)]
mod test_server;

pub use error::{GithubError, GithubResult};
pub use models::ModelsClient;
pub use releases::{GithubReleases, parse_repository};
