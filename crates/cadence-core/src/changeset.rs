//! Declared bump intents from changeset files.
//!
//! A changeset is a markdown file whose frontmatter lists one intent per package:
//!
//! ```text
//! ---
//! "@acme/ui": minor
//! "@acme/markdown": patch
//! ---
//!
//! Add a Button component.
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{BumpType, CoreError, CoreResult};

/// One parsed changeset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    /// Declared intents, in frontmatter order.
    pub intents: Vec<(String, BumpType)>,
    /// Markdown after the frontmatter, trimmed.
    pub summary: String,
}

/// Parses one changeset.
///
/// Files without frontmatter yield no intents and an empty summary.
///
/// # Errors
///
/// Returns a description of the first line that is not `"<name>": <bump>`.
pub fn parse_changeset(content: &str) -> Result<Changeset, String> {
    let mut lines = content.lines().map(str::trim_end);
    if lines.next() != Some("---") {
        return Ok(Changeset::default());
    }

    let mut intents = Vec::new();
    while let Some(line) = lines.next() {
        if line == "---" {
            let summary = lines.collect::<Vec<_>>().join("\n").trim().to_string();
            return Ok(Changeset { intents, summary });
        }
        if line.trim().is_empty() {
            continue;
        }

        let (name, bump) = line
            .rsplit_once(':')
            .ok_or_else(|| format!("expected \"<package>\": <bump>, got {line:?}"))?;
        let name = name.trim().trim_matches(['"', '\'']);
        if name.is_empty() {
            return Err(format!("missing package name in {line:?}"));
        }
        intents.push((name.to_string(), bump.parse()?));
    }

    Err("unterminated frontmatter".to_string())
}

/// Merges intents per package, keeping the more significant bump.
pub fn merge_intents<I>(intents: I) -> BTreeMap<String, BumpType>
where
    I: IntoIterator<Item = (String, BumpType)>,
{
    let mut merged: BTreeMap<String, BumpType> = BTreeMap::new();
    for (name, bump) in intents {
        merged
            .entry(name)
            .and_modify(|current| *current = (*current).max(bump))
            .or_insert(bump);
    }
    merged
}

/// Reads every changeset in a directory (`README.md` excluded), sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a changeset is invalid.
pub fn read_changeset_files(dir: &Path) -> CoreResult<Vec<Changeset>> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "md")
                && path.file_name().is_some_and(|name| name != "README.md")
        })
        .collect();
    paths.sort();

    let mut changesets = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path)?;
        let changeset = parse_changeset(&content).map_err(|reason| CoreError::InvalidChangeset {
            path: path.clone(),
            reason,
        })?;
        debug!(path = %path.display(), count = changeset.intents.len(), "read changeset");
        changesets.push(changeset);
    }
    Ok(changesets)
}

/// Reads every changeset in a directory and merges their intents.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a changeset is invalid.
pub fn read_changesets(dir: &Path) -> CoreResult<BTreeMap<String, BumpType>> {
    let changesets = read_changeset_files(dir)?;
    Ok(merge_intents(
        changesets.into_iter().flat_map(|changeset| changeset.intents),
    ))
}

/// Title used when there is nothing to describe.
pub const DEFAULT_TITLE: &str = "chore: version packages";

/// Names up to `max_listed` packages, otherwise counts them.
fn packages_phrase(names: &[&str], max_listed: usize) -> String {
    match names {
        [one] => (*one).to_string(),
        _ if names.len() <= max_listed => names.join(", "),
        _ => format!("{} packages", names.len()),
    }
}

/// Builds a conventional-commit release title from pending changesets.
///
/// Intents are merged per package. Summaries are scanned for breaking, feature,
/// fix and documentation keywords. A breaking keyword or a major intent gives a
/// `chore!:` prefix.
pub fn release_title(changesets: &[Changeset]) -> String {
    let merged = merge_intents(
        changesets
            .iter()
            .flat_map(|changeset| changeset.intents.iter().cloned()),
    );
    if merged.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    let summaries: Vec<String> = changesets
        .iter()
        .map(|changeset| changeset.summary.to_lowercase())
        .collect();
    let mentions = |test: fn(&str) -> bool| summaries.iter().any(|s| test(s));

    let breaking = mentions(|s| s.contains("breaking") || s.contains("!:"));
    let features = mentions(|s| s.starts_with("feat") || s.contains("feature") || s.contains("add"));
    let fixes = mentions(|s| s.contains("fix") || s.contains("bug"));
    let docs = mentions(|s| s.starts_with("docs") || s.contains("documentation"));

    let has_major = merged.values().any(|bump| *bump == BumpType::Major);
    let has_minor = merged.values().any(|bump| *bump == BumpType::Minor);

    let names: Vec<&str> = merged.keys().map(String::as_str).collect();
    let listed = packages_phrase(&names, 3);

    if breaking || has_major {
        return if names.len() == 1 {
            format!("chore!: release {listed} with breaking changes")
        } else {
            format!("chore!: release {listed} (breaking changes)")
        };
    }

    let detail = if features && fixes {
        Some("features and fixes")
    } else if features || has_minor {
        Some("new features")
    } else if fixes {
        Some("bug fixes")
    } else if docs {
        return format!(
            "chore: release {} with documentation updates",
            packages_phrase(&names, 1)
        );
    } else {
        None
    };

    match detail {
        Some(detail) => format!("chore: release {listed} with {detail}"),
        None => format!("chore: release {listed}"),
    }
}
