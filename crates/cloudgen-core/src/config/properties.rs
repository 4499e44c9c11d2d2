//! Flat `key=value` serialization of configuration trees.
//!
//! Nested maps become dotted keys, list elements get a bracketed index
//! (`key.sub[0]`), leaves use their natural text form. Lines are sorted so
//! the same tree always produces byte-identical output.

use std::collections::BTreeMap;

use super::ConfigValue;

/// Flattens a tree into dotted keys and text values.
pub fn flatten(values: &BTreeMap<String, ConfigValue>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (key, value) in values {
        flatten_value(&mut out, key.clone(), value);
    }
    out
}

fn flatten_value(out: &mut BTreeMap<String, String>, prefix: String, value: &ConfigValue) {
    match value {
        ConfigValue::Map(map) => {
            for (key, child) in map {
                flatten_value(out, format!("{prefix}.{key}"), child);
            }
        }
        ConfigValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(out, format!("{prefix}[{i}]"), item);
            }
        }
        leaf => {
            out.insert(prefix, leaf.to_string());
        }
    }
}

/// Renders a tree as sorted `key=value` lines joined by `\n`.
pub fn to_properties_string(values: &BTreeMap<String, ConfigValue>) -> String {
    let mut lines: Vec<String> = flatten(values)
        .into_iter()
        .map(|(key, value)| format!("{}={}", escape_key(&key), escape_value(&value)))
        .collect();
    lines.sort();
    lines.join("\n")
}

fn escape_key(key: &str) -> String {
    escape(key, true)
}

fn escape_value(value: &str) -> String {
    escape(value, false)
}

/// Java `.properties` escaping: separators and comment markers get a
/// backslash, control and non-ASCII characters become `\uXXXX` UTF-16 units.
/// Spaces are escaped everywhere in keys but only in leading position in values.
fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            ' ' => out.push(' '),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
    out
}
