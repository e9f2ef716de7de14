//! CLI definition.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Globals};

/// Release independently-versioned packages of a monorepo and cut a monorepo release.
#[derive(Debug, Parser)]
#[command(name = "cadence")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file (defaults to the nearest cadence.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the files exchanged between steps
    #[arg(long, global = true, value_name = "DIR", env = "CADENCE_HANDOFF_DIR")]
    pub handoff_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect the packages published by the current commit
    Detect(commands::detect::DetectArgs),

    /// Compute the monorepo bump, update the manifest, tag and push
    Bump(commands::bump::BumpArgs),

    /// Create one release per published package
    Release(commands::release::ReleaseArgs),

    /// Produce the combined release summary
    Summarize(commands::summarize::SummarizeArgs),

    /// Run every step in a single process
    Run(commands::run::RunArgs),

    /// Print a release title built from pending changesets
    Title(commands::title::TitleArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        let globals = Globals {
            config: self.config,
            handoff_dir: self.handoff_dir,
        };

        match self.command {
            Commands::Detect(args) => commands::detect::run(&globals, args),
            Commands::Bump(args) => commands::bump::run(&globals, args),
            Commands::Release(args) => commands::release::run(&globals, args),
            Commands::Summarize(args) => commands::summarize::run(&globals, args),
            Commands::Run(args) => commands::run::run(&globals, args),
            Commands::Title(args) => commands::title::run(args),
        }
    }
}
