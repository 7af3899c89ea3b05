//! Variable resolution for a file or a directory of files

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{MergeOptions, MergeStrategy, VarTree, load_file, merge};
use crate::error::{RndrError, Result};

/// Resolve the variable tree at `path`
///
/// A file is loaded on its own. A directory has its direct, non-hidden files
/// loaded in file-name order and folded together with `strategy`; files that
/// fail to parse are skipped. Any other path resolves to an empty tree.
pub fn resolve(path: &Path, strategy: MergeStrategy, options: &MergeOptions) -> Result<VarTree> {
    debug!(?path, %strategy, "resolve: called");
    if path.is_file() {
        return Ok(match load_file(path) {
            Some(Value::Object(tree)) => tree,
            Some(_) => {
                warn!(?path, "Variables file is not a mapping, ignoring it");
                Map::new()
            }
            None => Map::new(),
        });
    }

    if !path.is_dir() {
        debug!(?path, "resolve: path does not exist");
        return Ok(Map::new());
    }

    let mut resolved = Value::Object(Map::new());
    for file in var_files(path)? {
        match load_file(&file) {
            Some(incoming) => {
                debug!(?file, "resolve: merging file");
                resolved = merge(resolved, incoming, strategy, options);
            }
            None => debug!(?file, "resolve: skipping unparseable file"),
        }
    }

    info!(?path, %strategy, "Resolved variables");
    Ok(match resolved {
        Value::Object(tree) => tree,
        _ => Map::new(),
    })
}

fn var_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| RndrError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RndrError::io(dir, e))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let path = entry.path();
        if !hidden && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn tree(value: Value) -> VarTree {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_resolve_single_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("a.json");
        fs::write(&file, r#"{"name": "World"}"#).unwrap();

        let vars = resolve(&file, MergeStrategy::Recursive, &MergeOptions::default()).unwrap();
        assert_eq!(vars, tree(json!({"name": "World"})));
    }

    #[test]
    fn test_resolve_directory_recursive() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.json"), r#"{"a": {"x": 1}}"#).unwrap();
        fs::write(temp.path().join("b.yaml"), "a:\n  y: 2\n").unwrap();

        let vars = resolve(temp.path(), MergeStrategy::Recursive, &MergeOptions::default()).unwrap();
        assert_eq!(vars, tree(json!({"a": {"x": 1, "y": 2}})));
    }

    #[test]
    fn test_resolve_directory_replace() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.json"), r#"{"a": {"x": 1}}"#).unwrap();
        fs::write(temp.path().join("b.json"), r#"{"a": {"y": 2}}"#).unwrap();

        let vars = resolve(temp.path(), MergeStrategy::Replace, &MergeOptions::default()).unwrap();
        assert_eq!(vars, tree(json!({"a": {"y": 2}})));
    }

    #[test]
    fn test_resolve_later_file_wins_in_name_order() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("20-override.json"), r#"{"env": "prod"}"#).unwrap();
        fs::write(temp.path().join("10-base.json"), r#"{"env": "dev"}"#).unwrap();

        let vars = resolve(temp.path(), MergeStrategy::Replace, &MergeOptions::default()).unwrap();
        assert_eq!(vars, tree(json!({"env": "prod"})));
    }

    #[test]
    fn test_resolve_skips_unparseable_hidden_and_nested() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.json"), r#"{"a": 1}"#).unwrap();
        fs::write(temp.path().join("broken.yaml"), "{not json or yaml").unwrap();
        fs::write(temp.path().join(".hidden.json"), r#"{"hidden": true}"#).unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/n.json"), r#"{"nested": true}"#).unwrap();

        let vars = resolve(temp.path(), MergeStrategy::Recursive, &MergeOptions::default()).unwrap();
        assert_eq!(vars, tree(json!({"a": 1})));
    }

    #[test]
    fn test_resolve_applies_merge_options() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.json"), r#"{"l": [1, 2]}"#).unwrap();
        fs::write(temp.path().join("b.json"), r#"{"l": [3]}"#).unwrap();

        let options = MergeOptions::from_pairs([("overwrite_arrays", "true")]).unwrap();
        let vars = resolve(temp.path(), MergeStrategy::Recursive, &options).unwrap();
        assert_eq!(vars, tree(json!({"l": [3]})));
    }

    #[test]
    fn test_resolve_missing_path() {
        let temp = tempdir().unwrap();
        let vars = resolve(&temp.path().join("vars"), MergeStrategy::Recursive, &MergeOptions::default()).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn test_resolve_non_mapping_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("list.json");
        fs::write(&file, "[1, 2, 3]").unwrap();

        let vars = resolve(&file, MergeStrategy::Recursive, &MergeOptions::default()).unwrap();
        assert!(vars.is_empty());
    }
}
