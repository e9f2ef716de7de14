//! Configuration schema.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Git configuration.
    #[serde(default)]
    pub git: GitConfig,

    /// Monorepo manifest configuration.
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Handoff location between pipeline steps.
    #[serde(default)]
    pub handoff: HandoffConfig,

    /// Changelog lookup configuration.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// Release host configuration.
    #[serde(default)]
    pub release: ReleaseConfig,

    /// Summary generation configuration.
    #[serde(default)]
    pub summary: SummaryConfig,
}

impl Config {
    /// Checks values that deserialize fine but cannot drive a pipeline run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.git.remote.trim().is_empty() {
            return Err(ConfigError::Invalid("git.remote must not be empty".into()));
        }
        if self.manifest.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("manifest.path must not be empty".into()));
        }
        if self.summary.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "summary.max_tokens must be positive".into(),
            ));
        }
        if self.summary.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "summary.timeout_secs must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.summary.temperature) {
            return Err(ConfigError::Invalid(format!(
                "summary.temperature must be within 0.0..=2.0, got {}",
                self.summary.temperature
            )));
        }
        Ok(())
    }
}

/// Git configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Remote that commits and tags are pushed to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Author name for the monorepo bump commit.
    #[serde(default = "default_author_name")]
    pub author_name: String,

    /// Author email for the monorepo bump commit.
    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_author_name() -> String {
    "github-actions[bot]".to_string()
}

fn default_author_email() -> String {
    "github-actions[bot]@users.noreply.github.com".to_string()
}

/// Monorepo manifest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Path of the manifest holding the monorepo version, relative to the repository root.
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
        }
    }
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("package.json")
}

/// Handoff configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Directory holding the files exchanged between pipeline steps.
    #[serde(default = "default_handoff_dir")]
    pub dir: PathBuf,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            dir: default_handoff_dir(),
        }
    }
}

fn default_handoff_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Changelog lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Directories searched for `<dir>/<unscoped-name>/CHANGELOG.md`, in order.
    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<String>,

    /// Explicit changelog paths keyed by package name.
    #[serde(default)]
    pub paths: BTreeMap<String, PathBuf>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs(),
            paths: BTreeMap::new(),
        }
    }
}

fn default_search_dirs() -> Vec<String> {
    vec!["apps".to_string(), "packages".to_string()]
}

/// Release host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Base URL of the GitHub REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Branch the releases target.
    #[serde(default = "default_target")]
    pub target: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            target: default_target(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_target() -> String {
    "main".to_string()
}

/// How the combined release summary is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStrategy {
    /// Ask the text generation service, falling back to the template.
    #[default]
    Enrichment,
    /// Concatenate changelog sections; no external calls.
    Changelog,
}

/// Summary generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Summary strategy.
    #[serde(default)]
    pub strategy: SummaryStrategy,

    /// Chat completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum output tokens per request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            strategy: SummaryStrategy::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://models.inference.ai.azure.com/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}
