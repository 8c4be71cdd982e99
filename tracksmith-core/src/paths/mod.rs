//! Output path resolution
//!
//! Turns a user-supplied relative path (or a target default) into a vetted
//! absolute location under the working directory. The containment check is
//! lexical: `.` and `..` segments are resolved before the prefix comparison,
//! symlinks are not. It runs once, when the plugin descriptor is created;
//! the resulting path is trusted afterwards.

mod filename;

pub use filename::{validate_file_name, FileNameError};

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::plugin::Source;

/// Output path validation errors
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Output path is empty")]
    EmptyOutputPath,

    #[error("Output path '{path}' is not nested under the working directory")]
    NotNestedPath { path: PathBuf },

    #[error("Invalid output path: {detail}")]
    InvalidPath { detail: String },

    #[error(transparent)]
    FileName(#[from] FileNameError),
}

/// Resolve and vet an output path for one generation target.
///
/// An absent input falls back to `default_file_name`; an input that was
/// explicitly given but trims to nothing is rejected instead of silently
/// substituted. The parent directory is created if it does not exist.
pub fn resolve_output_path(
    input: Option<&str>,
    default_file_name: &str,
    working_dir: &Path,
    source: Source,
) -> Result<PathBuf, PathError> {
    let relative = match input.map(str::trim) {
        Some("") => return Err(PathError::EmptyOutputPath),
        Some(path) => path,
        None => default_file_name,
    };

    let base = normalize(working_dir);
    let candidate = normalize(&base.join(relative));

    if candidate == base || !candidate.starts_with(&base) {
        return Err(PathError::NotNestedPath { path: candidate });
    }

    let file_name = candidate
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PathError::InvalidPath {
            detail: format!("'{}' has no file name", candidate.display()),
        })?;
    validate_file_name(file_name, source)?;

    if let Some(parent) = candidate.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PathError::InvalidPath {
            detail: format!("cannot create '{}': {e}", parent.display()),
        })?;
    }

    Ok(candidate)
}

/// Resolve `.` and `..` segments lexically, without touching the filesystem.
///
/// Popping never escapes the root: `/a/../../b` normalizes to `/b`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
