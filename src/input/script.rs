use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::input::{InputError, read_upload};
use crate::session::{CycleInput, Upload};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScript {
    Wrapped { cycles: Vec<IndexMap<String, Value>> },
    Bare(Vec<IndexMap<String, Value>>),
}

/// One `CycleInput` per scripted interaction. A widget value of the form
/// `{"file": "<path>"}` attaches that file (relative to the script), and
/// `{"file": null}` clears it.
pub fn load_script(path: &Path) -> Result<Vec<CycleInput>, InputError> {
    let text = std::fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_script(&text, base)
}

pub fn parse_script(text: &str, base: &Path) -> Result<Vec<CycleInput>, InputError> {
    let raw: RawScript = serde_json::from_str(text)?;
    let cycles = match raw {
        RawScript::Wrapped { cycles } => cycles,
        RawScript::Bare(cycles) => cycles,
    };

    let mut out = Vec::with_capacity(cycles.len());
    for (idx, cycle) in cycles.into_iter().enumerate() {
        let mut input = CycleInput::default();
        for (key, value) in cycle {
            match file_reference(&value) {
                Some(Some(rel)) => {
                    let upload = load_file(base, rel).map_err(|e| {
                        InputError::InvalidScript(format!("cycle {idx}, widget {key}: {e}"))
                    })?;
                    input.files.insert(key, Some(upload));
                }
                Some(None) => {
                    input.files.insert(key, None);
                }
                None => {
                    input.values.insert(key, value);
                }
            }
        }
        out.push(input);
    }
    Ok(out)
}

fn file_reference(value: &Value) -> Option<Option<&str>> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    match obj.get("file")? {
        Value::String(path) => Some(Some(path.as_str())),
        Value::Null => Some(None),
        _ => None,
    }
}

fn load_file(base: &Path, rel: &str) -> Result<Upload, InputError> {
    let path = Path::new(rel);
    if path.is_absolute() {
        read_upload(path)
    } else {
        read_upload(&base.join(path))
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/script.rs"]
mod tests;
