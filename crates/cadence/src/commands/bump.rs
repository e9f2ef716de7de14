//! Bump command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cadence_core::{Pipeline, PipelineContext, StepStatus, read_changesets};
use clap::Args;

use super::Globals;

/// Arguments for the bump command.
#[derive(Debug, Args)]
pub struct BumpArgs {
    /// Directory of changeset files whose declared intents drive the bump
    #[arg(long, value_name = "DIR")]
    pub changesets: Option<PathBuf>,

    /// Token used to push the commit and tag
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Runs the bump command.
#[allow(clippy::needless_pass_by_value)]
pub fn run(globals: &Globals, args: BumpArgs) -> Result<()> {
    let workspace = globals.workspace(args.token)?;
    let packages = workspace
        .handoff
        .read_packages()
        .context("run `cadence detect` first")?;

    if packages.is_empty() {
        println!("No packages were published; nothing to bump.");
        return Ok(());
    }

    let intents = args
        .changesets
        .as_deref()
        .map(read_changesets)
        .transpose()
        .context("failed to read changesets")?;

    let pipeline = Pipeline::new(&workspace.repo, &workspace.fs, &workspace.config)
        .with_handoff(&workspace.handoff);
    let mut ctx = PipelineContext::new();
    ctx.packages = packages;

    let bump = pipeline
        .aggregate(&mut ctx, intents.as_ref())
        .context("failed to aggregate bump type")?;
    let version = pipeline
        .bump(&mut ctx, bump)
        .context("failed to bump monorepo version")?;
    let tag = pipeline
        .tag(&mut ctx, version)
        .context("failed to tag monorepo release")?;
    pipeline.push(&mut ctx, &tag).context("failed to push")?;

    for report in &ctx.reports {
        if let StepStatus::Skipped(reason) = &report.status {
            println!("  {}: skipped ({reason})", report.step);
        }
    }
    println!("Monorepo version: {tag} ({bump}, {} packages)", ctx.packages.len());
    Ok(())
}
