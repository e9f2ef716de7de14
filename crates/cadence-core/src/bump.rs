//! Monorepo-wide bump aggregation.

use std::fmt;
use std::str::FromStr;

use cadence_git::VersionControl;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{CoreResult, PackageRelease, Recovery, SemanticVersion, StepError, StepResult};

/// Version bump type, ordered `Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// Patch version bump (bug fixes).
    #[default]
    Patch,
    /// Minor version bump (new features, new packages).
    Minor,
    /// Major version bump (breaking changes).
    Major,
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

impl FromStr for BumpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(format!("unknown bump type: {other:?}")),
        }
    }
}

/// Aggregates declared per-package intents by taking the maximum.
///
/// An empty list yields [`BumpType::Patch`].
pub fn aggregate_intents<I>(intents: I) -> BumpType
where
    I: IntoIterator<Item = BumpType>,
{
    let mut aggregate = BumpType::Patch;
    for intent in intents {
        aggregate = aggregate.max(intent);
        if aggregate == BumpType::Major {
            break;
        }
    }
    aggregate
}

/// Finds the version a package release supersedes.
///
/// Tags matching `<name>@*` are sorted by version descending; the newest is the
/// release being processed, so the second entry is the previous one.
///
/// # Errors
///
/// Returns [`Recovery::FirstRelease`] when there is no previous tag, or a fatal
/// error if tags cannot be listed or the previous tag holds an invalid version.
pub fn previous_version<V: VersionControl>(
    vcs: &V,
    package: &str,
) -> StepResult<SemanticVersion> {
    let tags = vcs.tags_matching(&format!("{package}@*"))?;
    let Some(previous) = tags.get(1) else {
        return Err(StepError::Recoverable(Recovery::FirstRelease(
            package.to_string(),
        )));
    };

    let version = previous.rsplit('@').next().unwrap_or(previous);
    debug!(package, tag = %previous, "found previous tag");
    SemanticVersion::parse(version).map_err(|e| StepError::Fatal(e.into()))
}

/// Aggregates a bump from published versions and their previous tags.
///
/// A first release contributes at least minor. Any major increase is absorbing.
///
/// # Errors
///
/// Returns an error if a published version or a previous tag is invalid, or if
/// tags cannot be listed.
pub fn aggregate_from_history<V: VersionControl>(
    vcs: &V,
    packages: &[PackageRelease],
) -> CoreResult<BumpType> {
    let mut aggregate = BumpType::Patch;

    for package in packages {
        let current = SemanticVersion::parse(&package.version)?;

        let contribution = match previous_version(vcs, &package.name) {
            Ok(previous) if current.major > previous.major => BumpType::Major,
            Ok(previous) if current.minor > previous.minor => BumpType::Minor,
            Ok(_) => BumpType::Patch,
            Err(StepError::Recoverable(recovery)) => {
                info!(package = %package.name, %recovery, "counting as minor");
                BumpType::Minor
            }
            Err(StepError::Fatal(e)) => return Err(e),
        };

        debug!(package = %package.name, %contribution, "package bump");
        aggregate = aggregate.max(contribution);
        if aggregate == BumpType::Major {
            break;
        }
    }

    Ok(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockVcs;

    #[test]
    fn test_bump_type_ordering() {
        assert!(BumpType::Major > BumpType::Minor);
        assert!(BumpType::Minor > BumpType::Patch);
        assert_eq!(BumpType::default(), BumpType::Patch);
    }

    #[test]
    fn test_bump_type_display_and_parse() {
        for bump in [BumpType::Major, BumpType::Minor, BumpType::Patch] {
            assert_eq!(bump.to_string().parse::<BumpType>(), Ok(bump));
        }
        assert_eq!(" minor\n".parse::<BumpType>(), Ok(BumpType::Minor));
        assert!("none".parse::<BumpType>().is_err());
    }

    #[test]
    fn test_bump_type_serde() {
        assert_eq!(serde_json::to_string(&BumpType::Major).unwrap(), "\"major\"");
        let bump: BumpType = serde_json::from_str("\"minor\"").unwrap();
        assert_eq!(bump, BumpType::Minor);
    }

    #[test]
    fn test_aggregate_intents_takes_max() {
        let intents = [BumpType::Patch, BumpType::Patch, BumpType::Minor];
        assert_eq!(aggregate_intents(intents), BumpType::Minor);
    }

    #[test]
    fn test_aggregate_intents_major_absorbing() {
        let mut intents = vec![BumpType::Patch, BumpType::Major, BumpType::Minor];
        assert_eq!(aggregate_intents(intents.clone()), BumpType::Major);
        intents.push(BumpType::Patch);
        assert_eq!(aggregate_intents(intents), BumpType::Major);
    }

    #[test]
    fn test_aggregate_intents_empty() {
        assert_eq!(aggregate_intents(Vec::new()), BumpType::Patch);
    }

    #[test]
    fn test_previous_version_second_tag() {
        let vcs = MockVcs::default().with_tags(&[
            "@acme/ui@1.3.0",
            "@acme/ui@1.2.5",
            "@acme/ui@1.0.0",
        ]);
        let previous = previous_version(&vcs, "@acme/ui").unwrap();
        assert_eq!(previous, SemanticVersion::new(1, 2, 5));
    }

    #[test]
    fn test_previous_version_first_release() {
        let vcs = MockVcs::default().with_tags(&["@acme/ui@1.0.0"]);
        let result = previous_version(&vcs, "@acme/ui");
        assert!(matches!(
            result,
            Err(StepError::Recoverable(Recovery::FirstRelease(name))) if name == "@acme/ui"
        ));
    }

    #[test]
    fn test_history_major_increase() {
        let vcs = MockVcs::default().with_tags(&["@acme/ui@2.0.0", "@acme/ui@1.9.0"]);
        let packages = vec![PackageRelease::new("@acme/ui", "2.0.0")];
        assert_eq!(
            aggregate_from_history(&vcs, &packages).unwrap(),
            BumpType::Major
        );
    }

    #[test]
    fn test_history_minor_and_patch() {
        let vcs = MockVcs::default().with_tags(&[
            "@acme/ui@1.3.0",
            "@acme/ui@1.2.0",
            "@acme/markdown@0.4.2",
            "@acme/markdown@0.4.1",
        ]);

        let patch_only = vec![PackageRelease::new("@acme/markdown", "0.4.2")];
        assert_eq!(
            aggregate_from_history(&vcs, &patch_only).unwrap(),
            BumpType::Patch
        );

        let both = vec![
            PackageRelease::new("@acme/markdown", "0.4.2"),
            PackageRelease::new("@acme/ui", "1.3.0"),
        ];
        assert_eq!(aggregate_from_history(&vcs, &both).unwrap(), BumpType::Minor);
    }

    #[test]
    fn test_history_first_release_is_at_least_minor() {
        let vcs = MockVcs::default().with_tags(&["@acme/new@0.1.0"]);
        let packages = vec![PackageRelease::new("@acme/new", "0.1.0")];
        assert_eq!(
            aggregate_from_history(&vcs, &packages).unwrap(),
            BumpType::Minor
        );
    }

    #[test]
    fn test_history_invalid_published_version() {
        let vcs = MockVcs::default();
        let packages = vec![PackageRelease::new("@acme/ui", "latest")];
        assert!(aggregate_from_history(&vcs, &packages).is_err());
    }
}
