//! Template discovery
//!
//! Finds template files under a root path and prunes them with the glob
//! patterns listed in an ignore file. Relative inputs are resolved against
//! the working directory the caller passes in, so every path returned or
//! compared here is absolute.

mod ignore;
mod matcher;

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;

pub use ignore::{IgnorePattern, apply, load_patterns};
pub use matcher::match_files;

/// Discover templates under `root` and drop those excluded by `ignore_file`
///
/// The ignore file is only consulted when something matched and the file
/// exists; a missing ignore file is not an error.
pub fn matches(cwd: &Path, root: &Path, extension: &str, ignore_file: &Path) -> Result<Vec<PathBuf>> {
    debug!(?cwd, ?root, %extension, ?ignore_file, "matches: called");
    let matched = match_files(cwd, root, extension);
    let ignore_file = absolutize(cwd, ignore_file);

    if matched.is_empty() || !ignore_file.is_file() {
        debug!(count = matched.len(), "matches: skipping ignore filter");
        return Ok(matched);
    }

    let patterns = load_patterns(&ignore_file)?;
    let kept = apply(matched, &patterns);
    info!(count = kept.len(), patterns = patterns.len(), "Discovered templates");
    Ok(kept)
}

/// Resolve `path` against `base` and fold `.` and `..` components lexically
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Lexically normalise a path without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
