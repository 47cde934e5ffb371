//! Formatting utilities for CLI output.

use crate::{
    selector::PathSelector,
    store::{ChangeKind, StoreChange},
    value::Value,
};

/// ANSI color codes for terminal output
pub struct Colors;

impl Colors {
    /// Reset all formatting
    pub const RESET: &'static str = "\x1b[0m";
    /// Bold text
    pub const BOLD: &'static str = "\x1b[1m";
    /// Red color
    pub const RED: &'static str = "\x1b[31m";
}

/// Formats error messages with red styling
pub fn format_error(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::RED, text, Colors::RESET)
}

/// Formats a value for a one-line summary.
///
/// Scalars are shown in full; sequences and mappings show their size rather
/// than their contents.
///
/// # Examples
///
/// ```
/// use treewatch::{Value, cli::formatting::format_value};
///
/// assert_eq!(format_value(&Value::from("hello")), "\"hello\"");
/// assert_eq!(format_value(&Value::from(42)), "42");
/// assert_eq!(format_value(&Value::Sequence(vec![Value::Null])), "[1]");
/// ```
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("\"{s}\""),
        Value::Sequence(items) => format!("[{}]", items.len()),
        Value::Mapping(map) => format!("{{{}}}", map.len()),
    }
}

/// Formats a change as seen by the watcher at `watched`.
pub fn format_change(watched: &PathSelector, change: &StoreChange) -> String {
    let what = match &change.kind {
        ChangeKind::Replace => "replaced".to_string(),
        ChangeKind::Write { value } => format!("= {}", format_value(value)),
    };

    format!("{watched} <- {} {what} ({})", change.path, change.version)
}
