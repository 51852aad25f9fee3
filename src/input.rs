//! Loading of JSON object dumps

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

/// A mesh source object and the label it is reported under.
pub struct InputObject {
    pub label: String,
    pub object: Value,
}

/// Read one JSON file holding a mesh object or an array of them.
pub fn load_objects(path: &Path) -> anyhow::Result<Vec<InputObject>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let document: Value =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;
    Ok(split_document(&path.display().to_string(), document))
}

fn split_document(label: &str, document: Value) -> Vec<InputObject> {
    match document {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, object)| InputObject {
                label: format!("{label}[{i}]"),
                object,
            })
            .collect(),
        object => vec![InputObject {
            label: label.to_string(),
            object,
        }],
    }
}
