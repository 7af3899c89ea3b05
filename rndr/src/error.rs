//! Error types for rndr

use std::path::PathBuf;
use thiserror::Error;

/// Errors that escape the per-item containment boundary
#[derive(Debug, Error)]
pub enum RndrError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read ignore file {path}: {source}")]
    IgnoreFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value '{value}' for merge option '{key}' (expected true or false)")]
    InvalidMergeOption { key: String, value: String },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl RndrError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, RndrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_merge_option_message() {
        let err = RndrError::InvalidMergeOption {
            key: "overwrite_arrays".to_string(),
            value: "maybe".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("overwrite_arrays"));
        assert!(msg.contains("maybe"));
    }

    #[test]
    fn test_ignore_file_message_includes_path() {
        let err = RndrError::IgnoreFile {
            path: PathBuf::from("/tmp/project/.rndrignore"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(err.to_string().contains("/tmp/project/.rndrignore"));
    }
}
