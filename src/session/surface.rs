use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The widget toolkit as seen by producers: every call returns the widget's
/// current primitive value.
pub trait InteractionSurface {
    fn button(&mut self, key: &str) -> bool;
    fn checkbox(&mut self, key: &str, default: bool) -> bool;
    /// First option by default; `None` only when there are no options.
    fn select(&mut self, key: &str, options: &[String]) -> Option<String>;
    fn number(&mut self, key: &str, min: i64, max: i64, default: i64) -> i64;
    fn slider(&mut self, key: &str, min: f64, max: f64, default: f64, step: f64) -> f64;
    fn text(&mut self, key: &str, default: &str) -> String;
    fn file(&mut self, key: &str) -> Option<Upload>;
}

/// Widget values set by the user in one cycle, plus file uploads
/// (`None` clears a previously attached file).
#[derive(Debug, Clone, Default)]
pub struct CycleInput {
    pub values: IndexMap<String, Value>,
    pub files: IndexMap<String, Option<Upload>>,
}

#[derive(Debug, Clone)]
struct WidgetState {
    signature: String,
    value: Value,
}

/// Replays scripted cycles. Buttons fire only in the cycle that presses them;
/// other widgets keep their value across cycles until their parameters
/// (options, range or default) change, which resets them.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    input: IndexMap<String, Value>,
    widgets: HashMap<String, WidgetState>,
    files: HashMap<String, Upload>,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_file(&mut self, key: &str, upload: Upload) {
        self.files.insert(key.to_string(), upload);
    }

    pub fn begin_cycle(&mut self, cycle: CycleInput) {
        for (key, upload) in cycle.files {
            match upload {
                Some(upload) => {
                    self.files.insert(key, upload);
                }
                None => {
                    self.files.remove(&key);
                }
            }
        }
        self.input = cycle.values;
    }

    fn resolve(&mut self, key: &str, signature: String) -> Option<Value> {
        if let Some(value) = self.input.get(key) {
            self.widgets.insert(
                key.to_string(),
                WidgetState {
                    signature,
                    value: value.clone(),
                },
            );
            return Some(value.clone());
        }
        match self.widgets.get(key) {
            Some(state) if state.signature == signature => Some(state.value.clone()),
            Some(_) => {
                self.widgets.remove(key);
                None
            }
            None => None,
        }
    }
}

impl InteractionSurface for ScriptedSurface {
    fn button(&mut self, key: &str) -> bool {
        self.input.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn checkbox(&mut self, key: &str, default: bool) -> bool {
        match self.resolve(key, format!("checkbox:{default}")) {
            Some(Value::Bool(b)) => b,
            Some(other) => {
                warn!(widget = key, value = %other, "expected a boolean");
                default
            }
            None => default,
        }
    }

    fn select(&mut self, key: &str, options: &[String]) -> Option<String> {
        let first = options.first().cloned();
        match self.resolve(key, format!("select:{}", options.join("\u{1f}"))) {
            Some(Value::String(s)) if options.contains(&s) => Some(s),
            Some(other) => {
                warn!(widget = key, value = %other, "not one of the offered options");
                first
            }
            None => first,
        }
    }

    fn number(&mut self, key: &str, min: i64, max: i64, default: i64) -> i64 {
        match self.resolve(key, format!("number:{min}:{max}:{default}")) {
            Some(v) => match v.as_i64() {
                Some(n) => n.clamp(min, max),
                None => {
                    warn!(widget = key, value = %v, "expected an integer");
                    default
                }
            },
            None => default,
        }
    }

    fn slider(&mut self, key: &str, min: f64, max: f64, default: f64, step: f64) -> f64 {
        match self.resolve(key, format!("slider:{min}:{max}:{default}:{step}")) {
            Some(v) => match v.as_f64() {
                Some(x) if min <= max => x.clamp(min, max),
                Some(x) => x,
                None => {
                    warn!(widget = key, value = %v, "expected a number");
                    default
                }
            },
            None => default,
        }
    }

    fn text(&mut self, key: &str, default: &str) -> String {
        match self.resolve(key, format!("text:{default}")) {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => default.to_string(),
        }
    }

    fn file(&mut self, key: &str) -> Option<Upload> {
        self.files.get(key).cloned()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/session/surface.rs"]
mod tests;
