// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Literal conversion for values written in routes, config files and messages.

use serde_json::{Number, Value};

/// Converts literal text to a typed value.
///
/// In order: integers (including negative and `0x` hex), floats, booleans
/// (`true`/`t`/`false`/`f`, any case), the words `none`, `empty` and `space`.
/// Anything else stays a string.
///
/// # Example
/// ```
/// use the_filterworks::config::literal::convert_literal;
/// use serde_json::Value;
///
/// assert_eq!(convert_literal("-12"), Value::from(-12));
/// assert_eq!(convert_literal("0x1f"), Value::from(31));
/// assert_eq!(convert_literal("2.5"), Value::from(2.5));
/// assert_eq!(convert_literal("T"), Value::Bool(true));
/// assert_eq!(convert_literal("none"), Value::Null);
/// assert_eq!(convert_literal("empty"), Value::from(""));
/// assert_eq!(convert_literal("reverse"), Value::from("reverse"));
/// ```
pub fn convert_literal(text: &str) -> Value {
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        if let Ok(int) = i64::from_str_radix(hex, 16) {
            return Value::from(int);
        }
    }
    if looks_numeric(text) {
        if let Some(number) = text.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }
    match text.to_ascii_lowercase().as_str() {
        "true" | "t" => Value::Bool(true),
        "false" | "f" => Value::Bool(false),
        "none" => Value::Null,
        "empty" => Value::String(String::new()),
        "space" => Value::String(" ".to_string()),
        _ => Value::String(text.to_string()),
    }
}

fn looks_numeric(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
}

/// Splits `name:v1:v2` into the bare name and its converted values.
pub fn split_values(reference: &str) -> (String, Vec<Value>) {
    let mut parts = reference.split(':');
    let name = parts.next().unwrap_or_default().to_string();
    let values = parts.map(convert_literal).collect();
    (name, values)
}

/// The bare name of a stage reference, without any `:values` suffix.
pub fn strip_values(reference: &str) -> &str {
    reference.split(':').next().unwrap_or(reference)
}

/// Type names to try for a stage name, most specific first.
///
/// The exact name comes first, then the name with any numeric suffix removed,
/// then successively shorter `_`-joined prefixes.
///
/// # Example
/// ```
/// use the_filterworks::config::literal::type_candidates;
///
/// assert_eq!(
///     type_candidates("reverse_string_2"),
///     vec!["reverse_string_2", "reverse_string", "reverse"]
/// );
/// ```
pub fn type_candidates(name: &str) -> Vec<String> {
    let mut candidates = vec![name.to_string()];
    let stripped = name
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .trim_end_matches('_');
    if stripped.is_empty() {
        return candidates;
    }
    let segments: Vec<&str> = stripped.split('_').collect();
    for len in (1..=segments.len()).rev() {
        let candidate = segments[..len].join("_");
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Renders a value the way it would be written as a literal (strings unquoted).
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "none".to_string(),
        other => other.to_string(),
    }
}

/// Converts a YAML value from a config section. Strings go through
/// [`convert_literal`]; everything else maps structurally.
pub fn from_yaml(value: &serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => convert_literal(s),
        serde_yaml::Value::Sequence(items) => Value::Array(items.iter().map(from_yaml).collect()),
        serde_yaml::Value::Mapping(map) => Value::Object(
            map.iter()
                .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), from_yaml(v))))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => from_yaml(&tagged.value),
    }
}

/// Null and empty strings count as "no value" when rebinding.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
