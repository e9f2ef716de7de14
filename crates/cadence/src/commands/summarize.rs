//! Summarize command.

use anyhow::{Context, Result};
use cadence_core::{Pipeline, PipelineContext};
use cadence_github::ModelsClient;
use clap::Args;
use tracing::warn;

use super::{Globals, models_client, runtime};

/// Arguments for the summarize command.
#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// Token for the text generation service; without it the template summary is used
    #[arg(long, env = "MODELS_TOKEN", hide_env_values = true)]
    pub models_token: Option<String>,
}

/// Runs the summarize command.
#[allow(clippy::needless_pass_by_value)]
pub fn run(globals: &Globals, args: SummarizeArgs) -> Result<()> {
    let workspace = globals.workspace(None)?;
    let handoff = &workspace.handoff;

    let packages = handoff
        .read_packages()
        .context("run `cadence detect` first")?;
    if packages.is_empty() {
        println!("No packages were published; nothing to summarize.");
        return Ok(());
    }

    let bump = handoff.read_bump().context("run `cadence bump` first")?;
    let count = handoff
        .read_package_count()
        .context("run `cadence bump` first")?;
    if count != packages.len() {
        warn!(count, listed = packages.len(), "package count does not match package list");
    }

    let generator: Option<ModelsClient> = models_client(&workspace.config, args.models_token);
    let pipeline = Pipeline::new(&workspace.repo, &workspace.fs, &workspace.config)
        .with_handoff(handoff);
    let mut ctx = PipelineContext::new();
    ctx.packages = packages;

    let summary = runtime()?.block_on(pipeline.summarize(&mut ctx, bump, generator.as_ref()));

    println!("{}", summary.text);
    Ok(())
}
