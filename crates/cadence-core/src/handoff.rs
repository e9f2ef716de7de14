//! File-based handoff between separately invoked pipeline steps.
//!
//! Each file holds one UTF-8 value, is written by exactly one step and read by
//! the steps after it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{BumpType, CoreError, CoreResult, PackageRelease, SemanticVersion, parse_package_list};

/// A value exchanged through the handoff directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffKey {
    /// JSON array of `{name, version}`.
    PublishedPackages,
    /// `major`, `minor` or `patch`.
    BumpType,
    /// Decimal package count.
    PackageCount,
    /// New monorepo version.
    NewVersion,
    /// Markdown summary.
    Summary,
    /// `true` when the summary came from text generation.
    UsedEnrichment,
}

impl HandoffKey {
    /// File name inside the handoff directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::PublishedPackages => "published-packages.json",
            Self::BumpType => "bump-type.txt",
            Self::PackageCount => "package-count.txt",
            Self::NewVersion => "new-version.txt",
            Self::Summary => "release-summary.txt",
            Self::UsedEnrichment => "used-ai.txt",
        }
    }
}

impl fmt::Display for HandoffKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// The handoff directory.
#[derive(Debug, Clone)]
pub struct HandoffDir {
    dir: PathBuf,
}

impl HandoffDir {
    /// Creates a handoff store in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of a handoff file.
    #[must_use]
    pub fn path(&self, key: HandoffKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Writes a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, key: HandoffKey, value: &str) -> CoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        fs::write(&path, value)?;
        debug!(path = %path.display(), "wrote handoff");
        Ok(())
    }

    /// Reads a required value, trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingHandoff`] if the file does not exist.
    pub fn read(&self, key: HandoffKey) -> CoreResult<String> {
        self.read_optional(key)?
            .ok_or_else(|| CoreError::MissingHandoff(self.path(key)))
    }

    /// Reads an optional value, trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read_optional(&self, key: HandoffKey) -> CoreResult<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?.trim().to_string()))
    }

    fn invalid(&self, key: HandoffKey, reason: impl fmt::Display) -> CoreError {
        CoreError::InvalidHandoff {
            path: self.path(key),
            reason: reason.to_string(),
        }
    }

    /// Writes the published packages list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_packages(&self, packages: &[PackageRelease]) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(packages)
            .map_err(|e| self.invalid(HandoffKey::PublishedPackages, e))?;
        self.write(HandoffKey::PublishedPackages, &json)
    }

    /// Reads the published packages list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a package list.
    pub fn read_packages(&self) -> CoreResult<Vec<PackageRelease>> {
        let json = self.read(HandoffKey::PublishedPackages)?;
        parse_package_list(&json)
    }

    /// Reads the bump type.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or holds an unknown bump type.
    pub fn read_bump(&self) -> CoreResult<BumpType> {
        self.read(HandoffKey::BumpType)?
            .parse()
            .map_err(|e: String| self.invalid(HandoffKey::BumpType, e))
    }

    /// Reads the package count.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a decimal integer.
    pub fn read_package_count(&self) -> CoreResult<usize> {
        self.read(HandoffKey::PackageCount)?
            .parse()
            .map_err(|e| self.invalid(HandoffKey::PackageCount, e))
    }

    /// Reads the new monorepo version if a previous bump recorded one.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but holds an invalid version.
    pub fn read_new_version(&self) -> CoreResult<Option<SemanticVersion>> {
        self.read_optional(HandoffKey::NewVersion)?
            .map(|v| SemanticVersion::parse(&v).map_err(|e| self.invalid(HandoffKey::NewVersion, e)))
            .transpose()
    }

    /// Writes the outputs of the bump step.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn write_bump_outputs(
        &self,
        packages: &[PackageRelease],
        bump: BumpType,
        version: SemanticVersion,
    ) -> CoreResult<()> {
        self.write_packages(packages)?;
        self.write(HandoffKey::BumpType, &bump.to_string())?;
        self.write(HandoffKey::PackageCount, &packages.len().to_string())?;
        self.write(HandoffKey::NewVersion, &version.to_string())
    }

    /// Writes the summary and the enrichment flag.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn write_summary(&self, text: &str, used_enrichment: bool) -> CoreResult<()> {
        self.write(HandoffKey::Summary, text)?;
        self.write(HandoffKey::UsedEnrichment, if used_enrichment { "true" } else { "false" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_names() {
        assert_eq!(HandoffKey::PublishedPackages.file_name(), "published-packages.json");
        assert_eq!(HandoffKey::BumpType.to_string(), "bump-type.txt");
        assert_eq!(HandoffKey::UsedEnrichment.file_name(), "used-ai.txt");
    }

    #[test]
    fn test_missing_required() {
        let temp_dir = TempDir::new().unwrap();
        let handoff = HandoffDir::new(temp_dir.path());

        let err = handoff.read_bump().unwrap_err();
        assert!(matches!(err, CoreError::MissingHandoff(path) if path.ends_with("bump-type.txt")));
        assert_eq!(handoff.read_new_version().unwrap(), None);
    }

    #[test]
    fn test_bump_outputs_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let handoff = HandoffDir::new(temp_dir.path().join("nested"));
        let packages = vec![
            PackageRelease::new("@acme/ui", "2.0.0"),
            PackageRelease::new("@acme/web", "1.1.0"),
        ];

        handoff
            .write_bump_outputs(&packages, BumpType::Major, SemanticVersion::new(2, 0, 0))
            .unwrap();

        assert_eq!(handoff.read_packages().unwrap(), packages);
        assert_eq!(handoff.read_bump().unwrap(), BumpType::Major);
        assert_eq!(handoff.read_package_count().unwrap(), 2);
        assert_eq!(
            handoff.read_new_version().unwrap(),
            Some(SemanticVersion::new(2, 0, 0))
        );
        assert_eq!(
            fs::read_to_string(handoff.path(HandoffKey::BumpType)).unwrap(),
            "major"
        );
    }

    #[test]
    fn test_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let handoff = HandoffDir::new(temp_dir.path());
        handoff.write(HandoffKey::BumpType, "huge").unwrap();
        handoff.write(HandoffKey::PackageCount, "three").unwrap();
        handoff.write(HandoffKey::NewVersion, "2.0").unwrap();

        assert!(matches!(handoff.read_bump(), Err(CoreError::InvalidHandoff { .. })));
        assert!(matches!(
            handoff.read_package_count(),
            Err(CoreError::InvalidHandoff { .. })
        ));
        assert!(matches!(
            handoff.read_new_version(),
            Err(CoreError::InvalidHandoff { .. })
        ));
    }

    #[test]
    fn test_read_trims() {
        let temp_dir = TempDir::new().unwrap();
        let handoff = HandoffDir::new(temp_dir.path());
        handoff.write(HandoffKey::BumpType, "minor\n").unwrap();
        assert_eq!(handoff.read_bump().unwrap(), BumpType::Minor);
    }

    #[test]
    fn test_write_summary() {
        let temp_dir = TempDir::new().unwrap();
        let handoff = HandoffDir::new(temp_dir.path());
        handoff.write_summary("## Workspace Updates", false).unwrap();

        assert_eq!(handoff.read(HandoffKey::Summary).unwrap(), "## Workspace Updates");
        assert_eq!(handoff.read(HandoffKey::UsedEnrichment).unwrap(), "false");
    }
}
