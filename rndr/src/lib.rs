//! rndr - template discovery and rendering
//!
//! rndr finds template files under a directory tree, resolves variables from
//! JSON/YAML files and renders each template next to its source.
//!
//! # Pipeline
//!
//! ```text
//! discovery::matches ──> [template paths] ─┐
//!                                          ├──> TemplateEngine (per template)
//! vars::resolve      ──> VarTree ──────────┘
//! ```
//!
//! The variable tree is resolved once per run and shared read-only by every
//! template evaluation. A failing template is reported and the batch goes on.
//!
//! # Modules
//!
//! - [`discovery`] - glob matching and ignore file filtering
//! - [`vars`] - variable loading, merging and resolution
//! - [`template`] - template evaluation and rendering
//! - [`commands`] - `check`, `list`, `render`, `vars` and `version`
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod template;
pub mod vars;

pub use config::{Config, Overrides, Settings};
pub use discovery::{IgnorePattern, absolutize, matches};
pub use error::{Result, RndrError};
pub use template::{TemplateEngine, output_path};
pub use vars::{MergeOptions, MergeStrategy, VarTree, load_file, merge, resolve};
