//! GitHub Actions output files.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// How a package release step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Package name.
    pub name: String,
    /// Published version.
    pub version: String,
    /// Release tag.
    pub tag: String,
    /// Human-readable release URL.
    pub url: String,
    /// `false` when the release already existed.
    pub created: bool,
}

fn append(path: &Path, text: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())
}

/// Appends `key=value` to a `GITHUB_OUTPUT` file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn append_output(path: &Path, key: &str, value: &str) -> io::Result<()> {
    append(path, &format!("{key}={value}\n"))
}

/// Appends markdown to a `GITHUB_STEP_SUMMARY` file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn append_step_summary(path: &Path, markdown: &str) -> io::Result<()> {
    append(path, markdown)
}

/// Renders the release table for the job summary.
pub fn render_release_table(outcomes: &[ReleaseOutcome]) -> String {
    let mut text = String::from("## Package Releases\n\n");
    text.push_str("| Package | Version | Tag | Release |\n");
    text.push_str("|---------|---------|-----|---------|\n");
    for outcome in outcomes {
        let label = if outcome.created { "View" } else { "View (existing)" };
        text.push_str(&format!(
            "| {} | {} | `{}` | [{label}]({}) |\n",
            outcome.name, outcome.version, outcome.tag, outcome.url
        ));
    }
    text.push_str(&format!(
        "\n**Total packages released:** {}\n",
        outcomes.len()
    ));
    text
}
