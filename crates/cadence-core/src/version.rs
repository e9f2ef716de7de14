//! Three-part semantic versions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::{BumpType, VersionError};

/// A `major.minor.patch` version.
///
/// Pre-release and build suffixes are accepted by [`SemanticVersion::parse`]
/// but discarded; ordering only considers the three numeric components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SemanticVersion {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl SemanticVersion {
    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `major.minor.patch[-prerelease][+build]`.
    ///
    /// # Errors
    ///
    /// - [`VersionError::InvalidFormat`] for empty input or fewer than three components
    /// - [`VersionError::InvalidComponents`] when a component is not an integer
    /// - [`VersionError::NegativeValue`] when a component is negative
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        if version.is_empty() {
            return Err(VersionError::InvalidFormat(version.to_string()));
        }

        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() < 3 {
            return Err(VersionError::InvalidFormat(version.to_string()));
        }

        // "0-beta+build" -> "0"
        let patch = parts[2]
            .split(['-', '+'])
            .next()
            .unwrap_or_default();

        let component = |raw: &str| -> Result<u64, VersionError> {
            let value: i64 = raw
                .parse()
                .map_err(|_| VersionError::InvalidComponents(version.to_string()))?;
            u64::try_from(value).map_err(|_| VersionError::NegativeValue(version.to_string()))
        };

        Ok(Self {
            major: component(parts[0])?,
            minor: component(parts[1])?,
            patch: component(patch)?,
        })
    }

    /// Returns the version after applying a bump.
    #[must_use]
    pub const fn bump(self, bump: BumpType) -> Self {
        match bump {
            BumpType::Major => Self::new(self.major + 1, 0, 0),
            BumpType::Minor => Self::new(self.major, self.minor + 1, 0),
            BumpType::Patch => Self::new(self.major, self.minor, self.patch + 1),
        }
    }

    /// Compares two version strings on major, minor and patch.
    ///
    /// # Errors
    ///
    /// Returns an error if either string fails to parse.
    pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
        Ok(Self::parse(a)?.cmp(&Self::parse(b)?))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(
            SemanticVersion::parse("1.4.2").unwrap(),
            SemanticVersion::new(1, 4, 2)
        );
    }

    #[test]
    fn test_parse_discards_suffixes() {
        for input in ["2.1.0", "2.1.0-beta.1", "2.1.0+build.7", "2.1.0-rc.1+sha.abc"] {
            let version = SemanticVersion::parse(input).unwrap();
            assert_eq!(version, SemanticVersion::new(2, 1, 0), "input: {input}");
        }
    }

    #[test]
    fn test_parse_prerelease_patch_zero() {
        let version = SemanticVersion::parse("1.0.0-beta.1").unwrap();
        assert_eq!(version.patch, 0);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(
            SemanticVersion::parse(""),
            Err(VersionError::InvalidFormat(String::new()))
        );
    }

    #[test]
    fn test_parse_too_few_components() {
        assert!(matches!(
            SemanticVersion::parse("1.2"),
            Err(VersionError::InvalidFormat(_))
        ));
        assert!(matches!(
            SemanticVersion::parse("1"),
            Err(VersionError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_non_integer() {
        assert!(matches!(
            SemanticVersion::parse("a.b.c"),
            Err(VersionError::InvalidComponents(_))
        ));
        assert!(matches!(
            SemanticVersion::parse("1.x.0"),
            Err(VersionError::InvalidComponents(_))
        ));
        assert!(matches!(
            SemanticVersion::parse("1.0.-beta"),
            Err(VersionError::InvalidComponents(_))
        ));
    }

    #[test]
    fn test_parse_negative() {
        assert!(matches!(
            SemanticVersion::parse("-1.0.0"),
            Err(VersionError::NegativeValue(_))
        ));
        assert!(matches!(
            SemanticVersion::parse("1.-2.0"),
            Err(VersionError::NegativeValue(_))
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let version = SemanticVersion::parse("10.20.30-alpha").unwrap();
        assert_eq!(version.to_string(), "10.20.30");
        assert_eq!("3.0.1".parse::<SemanticVersion>().unwrap().to_string(), "3.0.1");
    }

    #[test]
    fn test_bump() {
        let version = SemanticVersion::new(1, 2, 3);
        assert_eq!(version.bump(BumpType::Major), SemanticVersion::new(2, 0, 0));
        assert_eq!(version.bump(BumpType::Minor), SemanticVersion::new(1, 3, 0));
        assert_eq!(version.bump(BumpType::Patch), SemanticVersion::new(1, 2, 4));
    }

    #[test]
    fn test_bump_then_major() {
        let version = SemanticVersion::new(1, 4, 2);
        for first in [BumpType::Patch, BumpType::Minor, BumpType::Major] {
            let bumped = version.bump(first).bump(BumpType::Major);
            assert_eq!(bumped, SemanticVersion::new(3, 0, 0), "first: {first}");
        }
    }

    #[test]
    fn test_compare() {
        assert_eq!(SemanticVersion::compare("1.10.0", "1.9.9"), Ok(Ordering::Greater));
        assert_eq!(SemanticVersion::compare("0.1.0", "1.0.0"), Ok(Ordering::Less));
        assert_eq!(SemanticVersion::compare("1.0.0", "1.0.0"), Ok(Ordering::Equal));
    }

    #[test]
    fn test_compare_ignores_prerelease() {
        assert_eq!(
            SemanticVersion::compare("1.0.0-alpha", "1.0.0"),
            Ok(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_invalid() {
        assert!(SemanticVersion::compare("1.0", "1.0.0").is_err());
    }
}
