//! Variable file loading

use std::fs;
use std::path::Path;

use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;
use tracing::debug;

/// Parse a JSON or YAML file
///
/// JSON is tried first so numbers and strings keep their strict JSON typing.
/// Returns `None` when the file cannot be read or parsed as either format.
pub fn load_file(path: &Path) -> Option<Value> {
    debug!(?path, "load_file: called");
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(?path, %e, "load_file: unreadable");
            return None;
        }
    };

    if let Ok(value) = serde_json::from_str::<Value>(&content) {
        debug!("load_file: parsed as JSON");
        return Some(value);
    }

    match serde_yaml::from_str::<YamlValue>(&content) {
        Ok(yaml) => {
            debug!("load_file: parsed as YAML");
            Some(yaml_to_value(yaml))
        }
        Err(e) => {
            debug!(?path, %e, "load_file: not JSON or YAML");
            None
        }
    }
}

/// Convert a YAML document into the JSON value model
///
/// Scalar mapping keys are stringified, tags are dropped in favour of the
/// tagged value and non-finite floats become null.
pub fn yaml_to_value(yaml: YamlValue) -> Value {
    match yaml {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().and_then(Number::from_f64).map(Value::Number).unwrap_or(Value::Null)
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_value).collect()),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(key_to_string(key), yaml_to_value(value));
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => yaml_to_value(tagged.value),
    }
}

fn key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Tagged(tagged) => key_to_string(tagged.value),
        // Complex keys have no natural string form; use their JSON rendering
        other => yaml_to_value(other).to_string(),
    }
}
