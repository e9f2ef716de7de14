//! Published package detection.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{CoreError, CoreResult, PackageRelease};

/// Read access to files relative to the repository root.
pub trait FileSystem {
    /// Reads a file to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Returns whether a file exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by the real file system under a root directory.
#[derive(Debug, Clone)]
pub struct OsFileSystem {
    root: PathBuf,
}

impl OsFileSystem {
    /// Creates a file system rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).is_file()
    }
}

/// The two manifest fields detection relies on; everything else is ignored.
#[derive(Deserialize)]
struct PackageManifest {
    name: String,
    version: String,
}

/// Builds the list of packages published by the current commit.
///
/// Changed files named `changelog.md` (any case) point at a package directory;
/// its `package.json` provides name and version. Directories without a manifest
/// are skipped.
///
/// # Errors
///
/// Returns [`CoreError::MalformedManifest`] if a sibling manifest is not JSON or
/// lacks string `name` / `version` fields.
pub fn detect_published<F, S>(changed_files: &[S], fs: &F) -> CoreResult<Vec<PackageRelease>>
where
    F: FileSystem,
    S: AsRef<str>,
{
    let mut packages = Vec::new();

    for file in changed_files {
        let path = Path::new(file.as_ref());
        let is_changelog = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.eq_ignore_ascii_case("changelog.md"));
        if !is_changelog {
            continue;
        }

        let manifest_path = path.with_file_name("package.json");
        if !fs.exists(&manifest_path) {
            debug!(changelog = %path.display(), "no sibling manifest, skipping");
            continue;
        }

        let malformed = |reason: String| CoreError::MalformedManifest {
            path: manifest_path.clone(),
            reason,
        };
        let content = fs
            .read_to_string(&manifest_path)
            .map_err(|e| malformed(e.to_string()))?;
        let manifest: PackageManifest =
            serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;

        info!(name = %manifest.name, version = %manifest.version, "detected published package");
        packages.push(PackageRelease::new(manifest.name, manifest.version));
    }

    Ok(packages)
}
