//! Loading component type overrides from a file

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::path::Path;

/// Read an override object from a JSON or YAML file
///
/// Files ending in `.json` are read as JSON, anything else as YAML. The
/// document must be a mapping.
pub fn load_overrides(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read overrides file {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let value: Value = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML in {}", path.display()))?
    };

    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "Overrides in {} must be a mapping, found {}",
            path.display(),
            kind(&other)
        ),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
