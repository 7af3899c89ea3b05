//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Overrides;

/// rndr - render ERB-style templates from JSON/YAML variables
#[derive(Parser, Debug)]
#[command(
    name = "rndr",
    about = "Discover, check and render templates against merged variables",
    disable_version_flag = true
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Print version information
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verifies discovered templates
    Check {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        #[command(flatten)]
        vars: VarsArgs,
    },

    /// List discovered templates
    List {
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// Renders discovered templates
    Render {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        #[command(flatten)]
        vars: VarsArgs,
    },

    /// Lists combined variables
    Vars {
        /// Output format [yaml|json]
        #[arg(short, long)]
        format: Option<String>,

        #[command(flatten)]
        vars: VarsArgs,
    },

    /// Prints rndr version information
    Version,
}

impl Command {
    /// Collect the flags that override configured defaults
    pub fn overrides(&self) -> Overrides {
        debug!(command = ?self, "Command::overrides: called");
        let mut overrides = Overrides::default();
        match self {
            Self::Check { discovery, vars } | Self::Render { discovery, vars } => {
                discovery.apply(&mut overrides);
                vars.apply(&mut overrides);
            }
            Self::List { discovery } => discovery.apply(&mut overrides),
            Self::Vars { format, vars } => {
                overrides.format = format.clone();
                vars.apply(&mut overrides);
            }
            Self::Version => {}
        }
        overrides
    }
}

/// Options controlling template discovery
#[derive(Debug, Clone, Default, Args)]
pub struct DiscoveryArgs {
    /// Extension of templates
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Path to the ignore file
    #[arg(short, long)]
    pub ignore: Option<PathBuf>,

    /// Path to template or directory
    #[arg(short, long)]
    pub template: Option<PathBuf>,
}

impl DiscoveryArgs {
    fn apply(&self, overrides: &mut Overrides) {
        overrides.extension = self.extension.clone();
        overrides.ignore = self.ignore.clone();
        overrides.template = self.template.clone();
    }
}

/// Options controlling variable resolution
#[derive(Debug, Clone, Default, Args)]
pub struct VarsArgs {
    /// Recursively merge variables instead of replacing (true|false)
    #[arg(short, long)]
    pub merge: Option<bool>,

    /// Path to var file or directory
    #[arg(short = 'V', long)]
    pub vars: Option<PathBuf>,

    /// Recursive merge options as KEY=VALUE
    #[arg(short = 'o', long = "merge-opts", value_name = "KEY=VALUE", num_args = 1.., value_parser = parse_key_val)]
    pub merge_opts: Vec<(String, String)>,
}

impl VarsArgs {
    fn apply(&self, overrides: &mut Overrides) {
        overrides.merge = self.merge;
        overrides.vars = self.vars.clone();
        overrides.merge_opts = self.merge_opts.clone();
    }
}

/// Parse a single `KEY=VALUE` pair
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    debug!(%s, "parse_key_val: called");
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("invalid KEY=VALUE: no `=` found in `{}`", s)),
    }
}

/// Output format for the `vars` command
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VarsFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for VarsFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "VarsFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "VarsFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: yaml or json", s))
            }
        }
    }
}

impl std::fmt::Display for VarsFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}
