//! Subcommands and the setup they share.

pub mod bump;
pub mod detect;
pub mod release;
pub mod run;
pub mod summarize;
pub mod title;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_config::{CONFIG_FILE_NAME, Config, ConfigError, find_and_load_config, load_config};
use cadence_core::{HandoffDir, OsFileSystem, ci};
use cadence_git::{Repository, VersionControl};
use cadence_github::ModelsClient;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

/// Flags shared by every subcommand.
#[derive(Debug, Default)]
pub struct Globals {
    pub config: Option<PathBuf>,
    pub handoff_dir: Option<PathBuf>,
}

/// Everything a step needs from the local environment.
pub struct Workspace {
    pub config: Config,
    pub handoff: HandoffDir,
    pub repo: Repository,
    pub fs: OsFileSystem,
}

impl Globals {
    /// Loads the configuration. Without an explicit path, a missing file means defaults.
    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => {
                load_config(path).with_context(|| format!("failed to load {}", path.display()))
            }
            None => match find_and_load_config() {
                Ok(config) => Ok(config),
                Err(ConfigError::NotFound(_)) => {
                    debug!(file = CONFIG_FILE_NAME, "no configuration found, using defaults");
                    Ok(Config::default())
                }
                Err(e) => Err(e).context("failed to load configuration"),
            },
        }
    }

    /// Handoff directory: the flag wins over the configuration.
    pub fn handoff(&self, config: &Config) -> HandoffDir {
        HandoffDir::new(
            self.handoff_dir
                .clone()
                .unwrap_or_else(|| config.handoff.dir.clone()),
        )
    }

    /// Loads the configuration and opens the repository around the current directory.
    pub fn workspace(&self, token: Option<String>) -> Result<Workspace> {
        let config = self.load_config()?;
        let handoff = self.handoff(&config);

        let repo = Repository::discover(".")
            .context("failed to open git repository")?
            .with_remote(config.git.remote.clone())
            .with_identity(config.git.author_name.clone(), config.git.author_email.clone())
            .with_token(token);
        let fs = OsFileSystem::new(repo.workdir());

        Ok(Workspace {
            config,
            handoff,
            repo,
            fs,
        })
    }
}

/// Creates the runtime used to drive the remote clients.
pub fn runtime() -> Result<Runtime> {
    Runtime::new().context("failed to create async runtime")
}

/// Builds the text generation client when a token is available.
///
/// A client that cannot be built is treated like a missing token.
pub fn models_client(config: &Config, token: Option<String>) -> Option<ModelsClient> {
    let token = token.filter(|t| !t.trim().is_empty())?;
    match ModelsClient::new(&config.summary, token) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "text generation unavailable");
            None
        }
    }
}

/// Appends a `key=value` pair to the CI output file when one is configured.
pub fn write_output(path: Option<&Path>, key: &str, value: &str) -> Result<()> {
    if let Some(path) = path {
        ci::append_output(path, key, value)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}
