//! Glob-based template matching

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::absolutize;

/// Find template files for `extension` at `root`
///
/// A relative `root` is resolved against `cwd`. A file root yields itself
/// when its name matches `*.<extension>`. A directory root is walked
/// recursively (sorted by file name) and yields every matching file beneath
/// it. Anything else yields nothing.
pub fn match_files(cwd: &Path, root: &Path, extension: &str) -> Vec<PathBuf> {
    let root = absolutize(cwd, root);
    let root = root.as_path();
    debug!(?root, %extension, "match_files: called");
    let pattern = match Pattern::new(&format!("*.{}", Pattern::escape(extension))) {
        Ok(p) => p,
        Err(e) => {
            warn!(%extension, %e, "Unusable template extension");
            return Vec::new();
        }
    };

    if root.is_file() {
        debug!("match_files: root is a file");
        return if name_matches(&pattern, root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    if !root.is_dir() {
        debug!("match_files: root does not exist");
        return Vec::new();
    }

    let mut matched = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%e, "Skipping unreadable path during discovery");
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && name_matches(&pattern, path) {
            matched.push(path.to_path_buf());
        }
    }

    debug!(count = matched.len(), "match_files: returning matches");
    matched
}

fn name_matches(pattern: &Pattern, path: &Path) -> bool {
    path.file_name()
        .map(|name| pattern.matches(&name.to_string_lossy()))
        .unwrap_or(false)
}
