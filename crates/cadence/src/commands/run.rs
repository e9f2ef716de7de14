//! Run command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cadence_core::{Pipeline, PipelineContext, StepStatus, read_changesets};
use cadence_github::GithubReleases;
use clap::Args;

use super::detect::{print_packages, supplied_packages};
use super::release::report_releases;
use super::{Globals, models_client, runtime, write_output};

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Repository the releases are created in (owner/repo)
    #[arg(value_name = "OWNER/REPO")]
    pub repository: String,

    /// JSON list of published packages; skips changelog detection when set
    #[arg(long, env = "PUBLISHED_PACKAGES", value_name = "JSON")]
    pub published_packages: Option<String>,

    /// Directory of changeset files whose declared intents drive the bump
    #[arg(long, value_name = "DIR")]
    pub changesets: Option<PathBuf>,

    /// Token for pushing and for the GitHub API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Token for the text generation service; without it the template summary is used
    #[arg(long, env = "MODELS_TOKEN", hide_env_values = true)]
    pub models_token: Option<String>,

    /// GitHub Actions output file
    #[arg(long, env = "GITHUB_OUTPUT", value_name = "PATH")]
    pub github_output: Option<PathBuf>,

    /// GitHub Actions job summary file
    #[arg(long, env = "GITHUB_STEP_SUMMARY", value_name = "PATH")]
    pub step_summary: Option<PathBuf>,
}

/// Runs every step in one process.
#[allow(clippy::needless_pass_by_value)]
pub fn run(globals: &Globals, args: RunArgs) -> Result<()> {
    let supplied = supplied_packages(args.published_packages.as_deref())?;
    let intents = args
        .changesets
        .as_deref()
        .map(read_changesets)
        .transpose()
        .context("failed to read changesets")?;

    let workspace = globals.workspace(Some(args.token.clone()))?;
    let host = GithubReleases::new(
        &workspace.config.release.api_url,
        &args.repository,
        args.token,
    )
    .context("failed to create GitHub client")?;
    let generator = models_client(&workspace.config, args.models_token);

    let pipeline = Pipeline::new(&workspace.repo, &workspace.fs, &workspace.config)
        .with_handoff(&workspace.handoff);
    let mut ctx = PipelineContext::new();

    runtime()?
        .block_on(pipeline.run(&mut ctx, supplied, intents.as_ref(), &host, generator.as_ref()))
        .context("release pipeline failed")?;

    let output = args.github_output.as_deref();
    let json = serde_json::to_string(&ctx.packages).context("failed to encode package list")?;
    write_output(output, "published", if ctx.packages.is_empty() { "false" } else { "true" })?;
    write_output(output, "publishedPackages", &json)?;

    print_packages(&ctx.packages);
    if ctx.packages.is_empty() {
        return Ok(());
    }

    for report in &ctx.reports {
        if let StepStatus::Skipped(reason) = &report.status {
            println!("  {}: skipped ({reason})", report.step);
        }
    }
    if let (Some(tag), Some(bump)) = (&ctx.tag, ctx.bump) {
        println!("Monorepo version: {tag} ({bump})");
    }

    println!("Package releases:");
    report_releases(&ctx.releases, args.step_summary.as_deref())?;

    if let Some(summary) = &ctx.summary {
        println!("\n{}", summary.text);
    }
    Ok(())
}
