//! Core library for Cadence.
//!
//! This crate holds the release pipeline: version parsing, bump aggregation,
//! changelog extraction, published package detection, summary generation and
//! the orchestrator that sequences the idempotent release steps.

mod bump;
mod changelog;
mod changeset;
pub mod ci;
mod detect;
mod error;
mod handoff;
mod host;
pub mod manifest;
mod package;
mod pipeline;
mod summary;
#[cfg(test)]
mod testing;
mod version;

pub use bump::{BumpType, aggregate_from_history, aggregate_intents, previous_version};
pub use changelog::{ChangelogLocator, extract};
pub use changeset::{
    Changeset, DEFAULT_TITLE, merge_intents, parse_changeset, read_changeset_files,
    read_changesets, release_title,
};
pub use detect::{FileSystem, OsFileSystem, detect_published};
pub use error::{
    CoreError, CoreResult, Recovery, RemoteError, StepError, StepResult, VersionError,
};
pub use handoff::{HandoffDir, HandoffKey};
pub use host::{Prompt, ReleaseHost, ReleaseRequest, TextGenerator};
pub use package::{PackageRelease, parse_package_list};
pub use pipeline::{
    Pipeline, PipelineContext, Step, StepReport, StepStatus, bump_commit_message, monorepo_tag,
};
pub use summary::{
    GENERATED_LENGTH, PackageNotes, Summary, SummaryDepth, SummaryGenerator, build_prompt,
    changelog_summary, determine_depth, fallback_summary, validate_generated,
};
pub use version::SemanticVersion;
