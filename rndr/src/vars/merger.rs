//! Variable tree merging
//!
//! Two strategies are supported:
//!
//! - [`MergeStrategy::Recursive`] deep-merges nested mappings and combines
//!   sequences according to [`MergeOptions`]
//! - [`MergeStrategy::Replace`] overwrites top-level keys and never looks inside
//!   nested values
//!
//! Both sides must be mappings. Anything else merges to an empty mapping.

use std::cmp::Ordering;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{RndrError, Result};

/// How two variable trees are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Deep merge of nested mappings
    #[default]
    Recursive,
    /// Shallow, top-level overwrite
    Replace,
}

impl MergeStrategy {
    /// Map the CLI `--merge true|false` flag onto a strategy
    pub fn from_flag(merge: bool) -> Self {
        if merge {
            Self::Recursive
        } else {
            Self::Replace
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recursive => write!(f, "recursive"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// Tuning flags for [`MergeStrategy::Recursive`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Push a scalar onto an existing sequence instead of replacing it
    pub extend_existing_arrays: bool,
    /// Concatenate sequences instead of taking their union
    pub keep_array_duplicates: bool,
    /// Trace every merge decision at debug level
    pub merge_debug: bool,
    /// Merge sequences of mappings element by element
    pub merge_hash_arrays: bool,
    /// Incoming sequences replace existing ones outright
    pub overwrite_arrays: bool,
    /// Keep the base value when the two sides have different types
    pub preserve_unmergeables: bool,
    /// Sort sequences after merging
    pub sort_merged_arrays: bool,
    /// Prefix marking keys and sequence items to delete from the base
    pub knockout_prefix: Option<String>,
    /// Delimiter used to split string items of sequences before merging
    pub unpack_arrays: Option<String>,
}

impl MergeOptions {
    /// Build options from `key=value` pairs; unknown keys are ignored
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key.as_ref(), value.as_ref())?;
        }
        Ok(options)
    }

    /// Apply a single option
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        debug!(%key, %value, "MergeOptions::set: called");
        match key {
            "extend_existing_arrays" => self.extend_existing_arrays = parse_bool(key, value)?,
            "keep_array_duplicates" => self.keep_array_duplicates = parse_bool(key, value)?,
            "merge_debug" => self.merge_debug = parse_bool(key, value)?,
            "merge_hash_arrays" => self.merge_hash_arrays = parse_bool(key, value)?,
            "overwrite_arrays" => self.overwrite_arrays = parse_bool(key, value)?,
            "preserve_unmergeables" => self.preserve_unmergeables = parse_bool(key, value)?,
            "sort_merged_arrays" => self.sort_merged_arrays = parse_bool(key, value)?,
            "knockout_prefix" => self.knockout_prefix = non_empty(value),
            "unpack_arrays" => self.unpack_arrays = non_empty(value),
            _ => debug!(%key, "MergeOptions::set: ignoring unknown option"),
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(RndrError::InvalidMergeOption {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Merge `incoming` into `base`
///
/// Returns an empty mapping unless both values are mappings. `options` only
/// apply to the recursive strategy.
pub fn merge(base: Value, incoming: Value, strategy: MergeStrategy, options: &MergeOptions) -> Value {
    let (Value::Object(mut base), Value::Object(incoming)) = (base, incoming) else {
        debug!("merge: non-mapping input, returning empty tree");
        return Value::Object(Map::new());
    };

    match strategy {
        MergeStrategy::Replace => {
            for (key, value) in incoming {
                base.insert(key, value);
            }
        }
        MergeStrategy::Recursive => Merger { options }.merge_maps(&mut base, incoming),
    }

    Value::Object(base)
}

struct Merger<'a> {
    options: &'a MergeOptions,
}

impl Merger<'_> {
    fn knockout(&self) -> Option<&str> {
        self.options.knockout_prefix.as_deref()
    }

    /// The key a `<prefix><key>` marker knocks out; a bare prefix is an ordinary key
    fn knockout_target<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.knockout()?).filter(|target| !target.is_empty())
    }

    fn trace(&self, key: &str, action: &str) {
        if self.options.merge_debug {
            debug!(%key, %action, "merge");
        }
    }

    fn merge_maps(&self, base: &mut Map<String, Value>, incoming: Map<String, Value>) {
        for (key, value) in incoming {
            if let Some(target) = self.knockout_target(&key) {
                self.trace(target, "knocked out by key");
                base.shift_remove(target);
                continue;
            }
            if let Some(prefix) = self.knockout() {
                if value.as_str() == Some(prefix) {
                    self.trace(&key, "knocked out by value");
                    base.shift_remove(&key);
                    continue;
                }
            }

            match base.get_mut(&key) {
                Some(existing) => {
                    self.trace(&key, "merging");
                    let merged = self.merge_values(existing.take(), value);
                    *existing = merged;
                }
                None => {
                    self.trace(&key, "adding");
                    base.insert(key, self.strip_knockouts(value));
                }
            }
        }
    }

    fn merge_values(&self, base: Value, incoming: Value) -> Value {
        match (base, incoming) {
            (Value::Object(mut base), Value::Object(incoming)) => {
                self.merge_maps(&mut base, incoming);
                Value::Object(base)
            }
            (Value::Array(base), Value::Array(incoming)) => Value::Array(self.merge_arrays(base, incoming)),
            (Value::Array(mut base), incoming) if self.options.extend_existing_arrays => {
                base.push(incoming);
                Value::Array(base)
            }
            (base, incoming) if self.options.preserve_unmergeables && mismatched(&base, &incoming) => base,
            (_, incoming) => self.strip_knockouts(incoming),
        }
    }

    fn merge_arrays(&self, base: Vec<Value>, incoming: Vec<Value>) -> Vec<Value> {
        if self.options.overwrite_arrays {
            return incoming;
        }

        let (mut base, mut incoming) = match self.options.unpack_arrays.as_deref() {
            Some(delimiter) => (unpack(base, delimiter), unpack(incoming, delimiter)),
            None => (base, incoming),
        };

        if let Some(prefix) = self.knockout() {
            if incoming.iter().any(|v| v.as_str() == Some(prefix)) {
                base.clear();
            }
            let knocked: Vec<&str> = incoming
                .iter()
                .filter_map(|v| v.as_str()?.strip_prefix(prefix))
                .filter(|s| !s.is_empty())
                .collect();
            base.retain(|v| !v.as_str().is_some_and(|s| knocked.contains(&s)));
            incoming.retain(|v| !v.as_str().is_some_and(|s| s.starts_with(prefix)));
        }

        let mut merged = if self.options.merge_hash_arrays
            && base.iter().all(Value::is_object)
            && incoming.iter().all(Value::is_object)
        {
            let mut incoming = incoming.into_iter();
            let mut merged: Vec<Value> = base
                .into_iter()
                .map(|b| match incoming.next() {
                    Some(i) => self.merge_values(b, i),
                    None => b,
                })
                .collect();
            merged.extend(incoming);
            merged
        } else if self.options.keep_array_duplicates {
            base.extend(incoming);
            base
        } else {
            for item in incoming {
                if !base.contains(&item) {
                    base.push(item);
                }
            }
            base
        };

        if self.options.sort_merged_arrays {
            merged.sort_by(compare_values);
        }
        merged
    }

    /// Drop knockout markers from a value that has nothing to knock out
    fn strip_knockouts(&self, value: Value) -> Value {
        let Some(prefix) = self.knockout() else {
            return value;
        };
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(k, v)| self.knockout_target(k).is_none() && v.as_str() != Some(prefix))
                    .map(|(k, v)| (k, self.strip_knockouts(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .filter(|v| !v.as_str().is_some_and(|s| s.starts_with(prefix)))
                    .map(|v| self.strip_knockouts(v))
                    .collect(),
            ),
            other => other,
        }
    }
}

fn unpack(items: Vec<Value>, delimiter: &str) -> Vec<Value> {
    items
        .into_iter()
        .flat_map(|item| match item {
            Value::String(s) => s.split(delimiter).map(|part| Value::String(part.to_string())).collect(),
            other => vec![other],
        })
        .collect()
}

/// A null base never blocks a merge
fn mismatched(base: &Value, incoming: &Value) -> bool {
    !base.is_null() && rank(base) != rank(incoming)
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
