//! Release command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_core::ci::{self, ReleaseOutcome};
use cadence_core::{Pipeline, PipelineContext};
use cadence_github::GithubReleases;
use clap::Args;

use super::{Globals, runtime};

/// Arguments for the release command.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Repository the releases are created in (owner/repo)
    #[arg(value_name = "OWNER/REPO")]
    pub repository: String,

    /// Token for the GitHub API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// GitHub Actions job summary file
    #[arg(long, env = "GITHUB_STEP_SUMMARY", value_name = "PATH")]
    pub step_summary: Option<PathBuf>,
}

/// Prints the release outcomes and appends the job summary table.
pub fn report_releases(outcomes: &[ReleaseOutcome], step_summary: Option<&Path>) -> Result<()> {
    for outcome in outcomes {
        let state = if outcome.created { "created" } else { "exists" };
        println!("  {} ({state}): {}", outcome.tag, outcome.url);
    }

    if let Some(path) = step_summary {
        ci::append_step_summary(path, &ci::render_release_table(outcomes))
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Runs the release command.
#[allow(clippy::needless_pass_by_value)]
pub fn run(globals: &Globals, args: ReleaseArgs) -> Result<()> {
    let workspace = globals.workspace(Some(args.token.clone()))?;
    let packages = workspace
        .handoff
        .read_packages()
        .context("run `cadence detect` first")?;

    if packages.is_empty() {
        println!("No packages were published; nothing to release.");
        return Ok(());
    }

    let host = GithubReleases::new(
        &workspace.config.release.api_url,
        &args.repository,
        args.token,
    )
    .context("failed to create GitHub client")?;

    let pipeline = Pipeline::new(&workspace.repo, &workspace.fs, &workspace.config);
    let mut ctx = PipelineContext::new();
    ctx.packages = packages;

    runtime()?
        .block_on(pipeline.release(&mut ctx, &host))
        .context("failed to create releases")?;

    println!("Package releases:");
    report_releases(&ctx.releases, args.step_summary.as_deref())
}
