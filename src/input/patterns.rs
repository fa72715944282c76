use indexmap::IndexMap;
use serde_json::Value;

use crate::input::InputError;

/// Parses the pattern text field. Accepted forms: one quoted string, or a
/// `[...]` / `(...)` list of quoted strings (single or double quotes,
/// backslash escapes, optional trailing comma). Anything else is taken as one
/// literal pattern; blank text yields no patterns.
pub fn parse_pattern_text(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match parse_pattern_list(trimmed) {
        Some(patterns) => patterns,
        None => vec![trimmed.to_string()],
    }
}

fn parse_pattern_list(text: &str) -> Option<Vec<String>> {
    let mut cur = Cursor::new(text);
    let out = match cur.peek()? {
        '[' | '(' => {
            let close = if cur.bump()? == '[' { ']' } else { ')' };
            let mut items = Vec::new();
            loop {
                cur.skip_ws();
                if cur.peek()? == close {
                    cur.bump();
                    break;
                }
                items.push(cur.quoted()?);
                cur.skip_ws();
                match cur.bump()? {
                    ',' => continue,
                    c if c == close => break,
                    _ => return None,
                }
            }
            items
        }
        '"' | '\'' => vec![cur.quoted()?],
        _ => return None,
    };
    cur.skip_ws();
    if cur.peek().is_some() {
        return None;
    }
    Some(out)
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn quoted(&mut self) -> Option<String> {
        let quote = self.bump()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let mut out = String::new();
        loop {
            match self.bump()? {
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    c if c == quote || c == '\\' => out.push(c),
                    // Regex escapes such as `\d` pass through untouched.
                    c => {
                        out.push('\\');
                        out.push(c);
                    }
                },
                c if c == quote => return Some(out),
                c => out.push(c),
            }
        }
    }
}

/// Renders patterns the way the text field expects them back.
pub fn format_patterns(patterns: &[&str]) -> String {
    if patterns.is_empty() {
        return String::new();
    }
    serde_json::to_string(patterns).unwrap_or_default()
}

/// Subset file: a JSON object mapping labels to a list of patterns or to a
/// single pattern string. Label order follows the file.
pub fn parse_subset_file(bytes: &[u8]) -> Result<IndexMap<String, Vec<String>>, InputError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(map) = value else {
        return Err(InputError::InvalidSubsets(
            "expected an object of label -> patterns".to_string(),
        ));
    };
    let mut out = IndexMap::with_capacity(map.len());
    for (label, patterns) in map {
        let patterns = match patterns {
            Value::String(s) => vec![s],
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => list.push(s),
                        other => {
                            return Err(InputError::InvalidSubsets(format!(
                                "label {label}: pattern {other} is not a string"
                            )));
                        }
                    }
                }
                list
            }
            Value::Null => Vec::new(),
            other => {
                return Err(InputError::InvalidSubsets(format!(
                    "label {label}: expected a list of patterns, got {other}"
                )));
            }
        };
        out.insert(label, patterns);
    }
    Ok(out)
}

pub fn render_subset_file(patterns_by_label: &IndexMap<String, Vec<String>>) -> Result<String, InputError> {
    Ok(serde_json::to_string_pretty(patterns_by_label)?)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/patterns.rs"]
mod tests;
