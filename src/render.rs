//! Purpose: Render flat key-value results for CLI stdout.
//! Exports: `pairs_value`, `render_pretty`, `render_compact`, `render_lines`.
//! Role: Small, pure formatters used by CLI emission paths.
//! Invariants: When color is disabled, pretty output equals serde_json::to_string_pretty.
//! Invariants: ANSI escapes appear only when explicitly enabled.
use std::collections::BTreeMap;

use serde_json::{Map, Value};

const INDENT: &str = "  ";

// Conservative 8/16-color palette for broad terminal compatibility.
const COLOR_KEY: &str = "36";
const COLOR_STRING: &str = "32";

pub fn pairs_value(pairs: &BTreeMap<String, String>) -> Value {
    let map = pairs
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect::<Map<_, _>>();
    Value::Object(map)
}

pub fn render_pretty(pairs: &BTreeMap<String, String>, use_color: bool) -> String {
    if pairs.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::new();
    out.push_str("{\n");
    let len = pairs.len();
    for (idx, (key, value)) in pairs.iter().enumerate() {
        out.push_str(INDENT);
        push_colored(&encode_string(key), COLOR_KEY, use_color, &mut out);
        out.push_str(": ");
        push_colored(&encode_string(value), COLOR_STRING, use_color, &mut out);
        if idx + 1 < len {
            out.push(',');
        }
        out.push('\n');
    }
    out.push('}');
    out
}

pub fn render_compact(pairs: &BTreeMap<String, String>) -> String {
    serde_json::to_string(&pairs_value(pairs)).unwrap_or_else(|_| "{}".to_string())
}

pub fn render_lines(pairs: &BTreeMap<String, String>) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn encode_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn push_colored(text: &str, color: &str, use_color: bool, out: &mut String) {
    if !use_color {
        out.push_str(text);
        return;
    }
    out.push_str("\u{1b}[");
    out.push_str(color);
    out.push('m');
    out.push_str(text);
    out.push_str("\u{1b}[0m");
}
