//! Published package releases.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@[a-z0-9-]+/[a-z0-9-]+$").expect("invalid regex"));

/// One package's newly published version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageRelease {
    /// Scoped package name, e.g. `@acme/ui`.
    pub name: String,
    /// Published version.
    pub version: String,
}

impl PackageRelease {
    /// Creates a package release.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Returns the per-package release tag, `<name>@<version>`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Returns the name without its scope (`@acme/ui` -> `ui`).
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.name
            .rsplit_once('/')
            .map_or(self.name.as_str(), |(_, short)| short)
    }

    /// Validates the name and version before they reach a remote call.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPackageName`] or [`CoreError::InvalidPackageVersion`].
    pub fn validate(&self) -> CoreResult<()> {
        if !PACKAGE_NAME.is_match(&self.name) {
            return Err(CoreError::InvalidPackageName(self.name.clone()));
        }
        if semver::Version::parse(&self.version).is_err() {
            return Err(CoreError::InvalidPackageVersion {
                name: self.name.clone(),
                version: self.version.clone(),
            });
        }
        Ok(())
    }
}

/// Parses a JSON array of `{name, version}` objects.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPackageList`] on any shape mismatch.
pub fn parse_package_list(json: &str) -> CoreResult<Vec<PackageRelease>> {
    serde_json::from_str(json).map_err(|e| CoreError::InvalidPackageList(e.to_string()))
}
