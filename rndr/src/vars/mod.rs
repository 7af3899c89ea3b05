//! Template variables
//!
//! Variable files are JSON or YAML documents. A file is loaded into a
//! [`serde_json::Value`] and a directory of files is folded into a single
//! [`VarTree`] using a [`MergeStrategy`].

mod loader;
mod merger;
mod resolver;

pub use loader::{load_file, yaml_to_value};
pub use merger::{MergeOptions, MergeStrategy, merge};
pub use resolver::resolve;

/// Ordered mapping of variable names to values
pub type VarTree = serde_json::Map<String, serde_json::Value>;
