//! Title command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cadence_core::{DEFAULT_TITLE, read_changeset_files, release_title};
use clap::Args;
use tracing::info;

use super::write_output;

/// Arguments for the title command.
#[derive(Debug, Args)]
pub struct TitleArgs {
    /// Directory of pending changeset files
    #[arg(long, value_name = "DIR", default_value = ".changeset")]
    pub changesets: PathBuf,

    /// GitHub Actions output file
    #[arg(long, env = "GITHUB_OUTPUT", value_name = "PATH")]
    pub github_output: Option<PathBuf>,
}

/// Runs the title command.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: TitleArgs) -> Result<()> {
    let title = if args.changesets.is_dir() {
        let changesets = read_changeset_files(&args.changesets).with_context(|| {
            format!("failed to read changesets from {}", args.changesets.display())
        })?;
        release_title(&changesets)
    } else {
        info!(dir = %args.changesets.display(), "no changeset directory");
        DEFAULT_TITLE.to_string()
    };

    write_output(args.github_output.as_deref(), "title", &title)?;
    println!("{title}");
    Ok(())
}
