use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_yaml::{Mapping, Value};

/// Merge YAML documents, later over earlier.
///
/// Empty documents are skipped. A non-empty document must be a mapping.
pub fn merge_yaml_layers(docs: &[&str]) -> Result<Value> {
    let mut merged = Value::Mapping(Mapping::new());
    for (index, doc) in docs.iter().enumerate() {
        let layer: Value = serde_yaml::from_str(doc)
            .with_context(|| format!("config layer {index} is not valid YAML"))?;
        match layer {
            Value::Null => continue,
            Value::Mapping(_) => overlay(&mut merged, layer),
            _ => bail!("config layer {index} must be a mapping at the top level"),
        }
    }
    Ok(merged)
}

/// Read each file and merge them with [`merge_yaml_layers`].
pub fn read_yaml_layers<P: AsRef<Path>>(paths: &[P]) -> Result<Value> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let doc = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        docs.push(doc);
    }
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    merge_yaml_layers(&refs)
}

fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Mapping(base), Value::Mapping(layer)) => {
            for (key, value) in layer {
                if let Some(existing) = base.get_mut(&key) {
                    overlay(existing, value);
                } else {
                    base.insert(key, value);
                }
            }
        }
        (base, layer) => *base = layer,
    }
}
