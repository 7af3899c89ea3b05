//! rndr configuration types and loading
//!
//! Defaults can be set in a YAML config file and are overridden by CLI flags.
//! Relative paths are resolved against the working directory captured at
//! startup, never against ambient process state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::discovery::absolutize;
use crate::error::{RndrError, Result};
use crate::vars::{MergeOptions, MergeStrategy};

/// Project-local config file name
pub const LOCAL_CONFIG: &str = ".rndr.yml";

/// Main rndr configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Template file extension
    pub extension: String,

    /// Recursively merge variables instead of replacing them
    pub merge: bool,

    /// Template file or directory
    pub template: PathBuf,

    /// Variables file or directory
    pub vars: PathBuf,

    /// Ignore file listing glob patterns to skip
    pub ignore: PathBuf,

    /// Output format for the `vars` command
    pub format: String,

    /// Recursive merge tuning
    #[serde(rename = "merge-opts")]
    pub merge_opts: BTreeMap<String, serde_yaml::Value>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: "erb".to_string(),
            merge: true,
            template: PathBuf::from("."),
            vars: PathBuf::from("vars"),
            ignore: PathBuf::from(".rndrignore"),
            format: "yaml".to_string(),
            merge_opts: BTreeMap::new(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise `<cwd>/.rndr.yml` and then
    /// `<config_dir>/rndr/rndr.yml` are tried; broken implicit files are
    /// skipped with a warning.
    pub fn load(config_path: Option<&PathBuf>, cwd: &Path) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(&absolutize(cwd, path));
        }

        for path in Self::implicit_paths(cwd) {
            if path.is_file() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => warn!("Failed to load config from {}: {}", path.display(), e),
                }
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>, cwd: &Path) -> Option<String> {
        Self::load(config_path, cwd).ok().and_then(|config| config.log_level)
    }

    fn implicit_paths(cwd: &Path) -> Vec<PathBuf> {
        let mut paths = vec![cwd.join(LOCAL_CONFIG)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("rndr").join("rndr.yml"));
        }
        paths
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RndrError::io(path, e))?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| RndrError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Merge options from the config file as `key=value` strings
    fn merge_opt_pairs(&self) -> Vec<(String, String)> {
        self.merge_opts
            .iter()
            .map(|(key, value)| (key.clone(), scalar_to_string(value)))
            .collect()
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    }
}

/// Per-invocation values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub extension: Option<String>,
    pub merge: Option<bool>,
    pub template: Option<PathBuf>,
    pub vars: Option<PathBuf>,
    pub ignore: Option<PathBuf>,
    pub format: Option<String>,
    pub merge_opts: Vec<(String, String)>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Working directory captured at startup
    pub cwd: PathBuf,
    pub extension: String,
    pub strategy: MergeStrategy,
    pub merge_options: MergeOptions,
    /// Absolute template root
    pub template: PathBuf,
    /// Absolute variables path
    pub vars: PathBuf,
    /// Absolute ignore file path
    pub ignore_file: PathBuf,
    pub format: String,
}

impl Settings {
    /// Layer CLI overrides over the config file over built-in defaults
    pub fn resolve(cwd: &Path, config: &Config, overrides: &Overrides) -> Result<Self> {
        debug!(?cwd, ?overrides, "Settings::resolve: called");
        let pick = |over: &Option<PathBuf>, configured: &Path| {
            absolutize(cwd, over.as_deref().unwrap_or(configured))
        };

        let merge_options = MergeOptions::from_pairs(
            config
                .merge_opt_pairs()
                .into_iter()
                .chain(overrides.merge_opts.iter().cloned()),
        )?;

        Ok(Self {
            cwd: cwd.to_path_buf(),
            extension: overrides.extension.clone().unwrap_or_else(|| config.extension.clone()),
            strategy: MergeStrategy::from_flag(overrides.merge.unwrap_or(config.merge)),
            merge_options,
            template: pick(&overrides.template, &config.template),
            vars: pick(&overrides.vars, &config.vars),
            ignore_file: pick(&overrides.ignore, &config.ignore),
            format: overrides.format.clone().unwrap_or_else(|| config.format.clone()),
        })
    }
}
