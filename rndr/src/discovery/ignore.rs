//! Ignore file handling
//!
//! An ignore file lists one glob per line. Blank lines and lines starting with
//! `#` or `!` are skipped. Every remaining line is anchored to the directory
//! containing the ignore file.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use super::normalize;
use crate::error::{RndrError, Result};

/// `*` and `?` never cross a `/`
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A glob anchored to an absolute base directory
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    anchored: PathBuf,
    pattern: Pattern,
}

impl IgnorePattern {
    /// Anchor `line` to `base` and compile it
    ///
    /// Only the line is glob syntax; the directory it is anchored to is
    /// matched literally.
    pub fn new(base: &Path, line: &str) -> std::result::Result<Self, glob::PatternError> {
        let base = normalize(base);
        let anchored = normalize(&base.join(line));

        // `..` in the line may climb above base; the literal part is the
        // deepest ancestor of base the anchored path still sits under
        let literal = base
            .ancestors()
            .find(|ancestor| anchored.starts_with(ancestor))
            .unwrap_or_else(|| Path::new(""));
        let rest = anchored.strip_prefix(literal).unwrap_or(&anchored);

        let mut text = PathBuf::from(Pattern::escape(&literal.to_string_lossy()));
        if !rest.as_os_str().is_empty() {
            text.push(rest);
        }
        let pattern = Pattern::new(&text.to_string_lossy())?;
        Ok(Self { anchored, pattern })
    }

    /// The absolute pattern text
    pub fn as_path(&self) -> &Path {
        &self.anchored
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.pattern.matches_path_with(path, MATCH_OPTIONS)
    }
}

/// Read the patterns listed in `ignore_file`
pub fn load_patterns(ignore_file: &Path) -> Result<Vec<IgnorePattern>> {
    debug!(?ignore_file, "load_patterns: called");
    let content = fs::read_to_string(ignore_file).map_err(|source| RndrError::IgnoreFile {
        path: ignore_file.to_path_buf(),
        source,
    })?;
    let base = ignore_file.parent().unwrap_or_else(|| Path::new("/"));

    let patterns: Vec<IgnorePattern> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| match IgnorePattern::new(base, line) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(%line, %e, "Skipping invalid ignore pattern");
                None
            }
        })
        .collect();

    debug!(count = patterns.len(), "load_patterns: returning patterns");
    Ok(patterns)
}

/// Drop every path matched by any pattern
pub fn apply(paths: Vec<PathBuf>, patterns: &[IgnorePattern]) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| {
            let ignored = patterns.iter().any(|p| p.matches(path));
            if ignored {
                debug!(?path, "apply: ignoring path");
            }
            !ignored
        })
        .collect()
}
