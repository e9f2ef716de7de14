//! Version-control operations consumed by the release pipeline.

use std::cmp::Ordering;
use std::path::Path;

use crate::GitResult;

/// Version-control operations the release pipeline depends on.
///
/// [`Repository`](crate::Repository) implements this over git2; tests substitute
/// in-memory implementations.
pub trait VersionControl {
    /// Returns the repository working directory.
    fn workdir(&self) -> &Path;

    /// Returns the paths changed between `HEAD~1` and `HEAD`.
    ///
    /// A commit without a reachable parent (first commit, shallow clone) yields an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit trees cannot be read.
    fn changed_files(&self) -> GitResult<Vec<String>>;

    /// Returns local tags matching a glob pattern, sorted by version descending.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    fn tags_matching(&self, pattern: &str) -> GitResult<Vec<String>>;

    /// Returns whether the tag exists locally.
    ///
    /// # Errors
    ///
    /// Returns an error if references cannot be read.
    fn tag_exists(&self, tag: &str) -> GitResult<bool>;

    /// Returns whether the tag exists on the configured remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote cannot be listed.
    fn remote_tag_exists(&self, tag: &str) -> GitResult<bool>;

    /// Creates a tag pointing at `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::TagExists`](crate::GitError::TagExists) if the tag is
    /// already present, or another error if it cannot be written.
    fn create_tag(&self, tag: &str, message: &str) -> GitResult<()>;

    /// Returns the message of the `HEAD` commit, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if `HEAD` cannot be read.
    fn head_message(&self) -> GitResult<Option<String>>;

    /// Stages the given paths (relative to the working directory) and commits them.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or committing fails.
    fn commit_paths(&self, paths: &[&Path], message: &str) -> GitResult<()>;

    /// Pushes the current branch to the configured remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails or is rejected.
    fn push_head(&self) -> GitResult<()>;

    /// Pushes a single tag to the configured remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails or is rejected.
    fn push_tag(&self, tag: &str) -> GitResult<()>;
}

/// Compares two ref names the way `git tag --sort=v:refname` does: runs of
/// digits compare numerically, everything else compares bytewise.
pub fn compare_version_refnames(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n),
                    _ => x.cmp(y),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Splits a string into alternating digit and non-digit runs.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}
