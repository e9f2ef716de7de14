//! Monorepo manifest version I/O.
//!
//! The manifest is a `package.json`-style JSON object. Only `version` is
//! rewritten; key order is kept and output uses two-space indentation with a
//! trailing newline.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::{CoreError, CoreResult, SemanticVersion};

fn load(path: &Path) -> CoreResult<Map<String, Value>> {
    let invalid = |reason: String| CoreError::Manifest {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    match serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))? {
        Value::Object(map) => Ok(map),
        _ => Err(invalid("not a JSON object".to_string())),
    }
}

/// Reads the monorepo version. A missing `version` field reads as `0.0.0`.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, is not a JSON object, or
/// holds a version that does not parse.
pub fn read_version(path: &Path) -> CoreResult<SemanticVersion> {
    let manifest = load(path)?;
    match manifest.get("version") {
        None => Ok(SemanticVersion::default()),
        Some(Value::String(version)) => Ok(SemanticVersion::parse(version)?),
        Some(other) => Err(CoreError::Manifest {
            path: path.to_path_buf(),
            reason: format!("version is not a string: {other}"),
        }),
    }
}

/// Rewrites the monorepo version.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, parsed or written.
pub fn write_version(path: &Path, version: SemanticVersion) -> CoreResult<()> {
    let mut manifest = load(path)?;
    manifest.insert("version".to_string(), Value::String(version.to_string()));

    let content =
        serde_json::to_string_pretty(&Value::Object(manifest)).map_err(|e| CoreError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    fs::write(path, format!("{content}\n"))?;
    Ok(())
}
