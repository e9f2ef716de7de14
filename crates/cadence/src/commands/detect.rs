//! Detect command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cadence_core::{PackageRelease, Pipeline, PipelineContext, parse_package_list};
use clap::Args;

use super::{Globals, write_output};

/// Arguments for the detect command.
#[derive(Debug, Args)]
pub struct DetectArgs {
    /// JSON list of published packages; skips changelog detection when set
    #[arg(long, env = "PUBLISHED_PACKAGES", value_name = "JSON")]
    pub published_packages: Option<String>,

    /// GitHub Actions output file
    #[arg(long, env = "GITHUB_OUTPUT", value_name = "PATH")]
    pub github_output: Option<PathBuf>,
}

/// Parses a supplied package list; blank input means "not supplied".
pub fn supplied_packages(raw: Option<&str>) -> Result<Option<Vec<PackageRelease>>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(json) => parse_package_list(json)
            .map(Some)
            .context("PUBLISHED_PACKAGES is not a valid package list"),
    }
}

/// Prints the detected packages.
pub fn print_packages(packages: &[PackageRelease]) {
    if packages.is_empty() {
        println!("No packages were published.");
        return;
    }
    println!("Published packages:");
    for package in packages {
        println!("  {}", package.tag());
    }
}

/// Runs the detect command.
#[allow(clippy::needless_pass_by_value)]
pub fn run(globals: &Globals, args: DetectArgs) -> Result<()> {
    let supplied = supplied_packages(args.published_packages.as_deref())?;
    let workspace = globals.workspace(None)?;
    let pipeline = Pipeline::new(&workspace.repo, &workspace.fs, &workspace.config)
        .with_handoff(&workspace.handoff);

    let mut ctx = PipelineContext::new();
    let published = pipeline
        .detect(&mut ctx, supplied)
        .context("failed to detect published packages")?;

    let json = serde_json::to_string(&ctx.packages).context("failed to encode package list")?;
    let output = args.github_output.as_deref();
    write_output(output, "published", if published { "true" } else { "false" })?;
    write_output(output, "publishedPackages", &json)?;

    print_packages(&ctx.packages);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_packages_absent() {
        assert!(supplied_packages(None).unwrap().is_none());
        assert!(supplied_packages(Some("  ")).unwrap().is_none());
    }

    #[test]
    fn test_supplied_packages_empty_list() {
        let packages = supplied_packages(Some("[]")).unwrap().unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_supplied_packages_parsed() {
        let packages =
            supplied_packages(Some(r#"[{"name":"@acme/ui","version":"1.1.0"}]"#)).unwrap().unwrap();
        assert_eq!(packages, vec![PackageRelease::new("@acme/ui", "1.1.0")]);
    }

    #[test]
    fn test_supplied_packages_invalid() {
        let err = supplied_packages(Some(r#"{"name":"@acme/ui"}"#)).unwrap_err();
        assert!(err.to_string().contains("PUBLISHED_PACKAGES"));
    }
}
