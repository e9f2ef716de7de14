//! Git abstraction layer for Cadence.
//!
//! This crate provides the version-control operations the release pipeline needs:
//! - Changed files of the current commit
//! - Tag listing, lookup and creation
//! - Committing the monorepo manifest
//! - Pushing commits and tags, and listing remote tags

mod error;
mod repository;
mod version_control;

pub use error::{GitError, GitResult};
pub use repository::Repository;
pub use version_control::{VersionControl, compare_version_refnames};
