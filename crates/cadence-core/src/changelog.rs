//! Changelog section extraction and lookup.

use std::path::PathBuf;
use std::sync::LazyLock;

use cadence_config::ChangelogConfig;
use regex::Regex;
use tracing::debug;

use crate::{CoreResult, FileSystem, PackageRelease};

/// Matches a version header in either plain (`## 1.2.0`) or `v` (`## v1.2.0`) form.
static VERSION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^## v?\d+\.\d+\.\d+").expect("invalid regex"));

/// Returns the section of `document` under the `## <version>` header.
///
/// The header must match the whole line literally, so `1.0.0` never matches
/// `## v1.0.0` and the other way round. The section runs until the next version
/// header; other `##` headings such as `## Unreleased` stay inside it. Leading and
/// trailing blank lines are trimmed, everything else is returned as is.
pub fn extract<'a>(document: &'a str, version: &str) -> Option<&'a str> {
    let header = format!("## {version}");
    let mut offset = 0;
    let mut start = None;
    let mut end = document.len();

    for line in document.split_inclusive('\n') {
        let text = line.trim_end_matches(['\n', '\r']);
        match start {
            None if text == header => start = Some(offset + line.len()),
            Some(_) if VERSION_HEADER.is_match(text) => {
                end = offset;
                break;
            }
            _ => {}
        }
        offset += line.len();
    }

    let start = start?;
    Some(trim_blank_lines(&document[start..end]))
}

/// Strips whole blank lines from both ends, keeping inner bytes untouched.
fn trim_blank_lines(section: &str) -> &str {
    let mut start = 0;
    for line in section.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }

    let body = &section[start..];
    let mut end = 0;
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if !content.trim().is_empty() {
            end = offset + content.len();
        }
        offset += line.len();
    }

    &body[..end]
}

/// Finds changelogs for packages in the repository.
pub struct ChangelogLocator<'a, F: FileSystem> {
    fs: &'a F,
    config: &'a ChangelogConfig,
}

impl<'a, F: FileSystem> ChangelogLocator<'a, F> {
    /// Creates a locator over the given file system.
    #[must_use]
    pub fn new(fs: &'a F, config: &'a ChangelogConfig) -> Self {
        Self { fs, config }
    }

    /// Returns the changelog path of a package, if one exists.
    ///
    /// Explicit overrides win over `<search_dir>/<short name>/CHANGELOG.md`.
    pub fn locate(&self, package: &str) -> Option<PathBuf> {
        if let Some(path) = self.config.paths.get(package) {
            return self.fs.exists(path).then(|| path.clone());
        }

        let short = package.rsplit_once('/').map_or(package, |(_, short)| short);
        self.config
            .search_dirs
            .iter()
            .map(|dir| PathBuf::from(dir).join(short).join("CHANGELOG.md"))
            .find(|path| self.fs.exists(path))
    }

    /// Returns the changelog section for a package's published version.
    ///
    /// # Errors
    ///
    /// Returns an error if the changelog exists but cannot be read.
    pub fn section(&self, package: &PackageRelease) -> CoreResult<Option<String>> {
        let Some(path) = self.locate(&package.name) else {
            debug!(package = %package.name, "no changelog found");
            return Ok(None);
        };

        let document = self.fs.read_to_string(&path)?;
        let section = extract(&document, &package.version).map(str::to_string);
        debug!(
            package = %package.name,
            path = %path.display(),
            found = section.is_some(),
            "extracted changelog section"
        );
        Ok(section)
    }
}
