//! Colored CLI display utilities for producer output.
//!
//! Progress goes to stderr so stdout carries only the call result.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde_json::{Map, Value};

use crate::observer::{ObserverEvent, END_EVENT, ERROR_EVENT};

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated field values.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let head: String = s.chars().take(max_len - 3).collect();
    format!("{head}...")
}

/// Format record fields as `key=value` pairs, truncating long values.
#[must_use]
pub fn format_fields(fields: &Map<String, Value>, raw_mode: bool) -> String {
    fields
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => truncate(s, DEFAULT_MAX_LEN, raw_mode),
                other => truncate(&other.to_string(), DEFAULT_MAX_LEN, raw_mode),
            };
            format!("{k}={value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print an observer event.
pub fn print_event(event: &ObserverEvent, raw_mode: bool) {
    let ts = format_timestamp(&event.timestamp);
    let fields = format_fields(&event.fields, raw_mode);
    match event.name.as_str() {
        ERROR_EVENT => eprintln!("{} {} {}", ts.dimmed(), "[ERROR]".red().bold(), fields.red()),
        END_EVENT => eprintln!("{} {} {}", ts.dimmed(), "[END]".green().bold(), fields),
        name => eprintln!(
            "{} {} {}",
            ts.dimmed(),
            format!("[{name}]").blue().bold(),
            fields.dimmed()
        ),
    }
    let _ = io::stderr().flush();
}

/// Print the id of a published message.
pub fn print_message_id(message_id: &str) {
    println!("{message_id}");
    let _ = io::stdout().flush();
}

/// Print a connectivity test result.
pub fn print_test_result(target: &str, success: bool) {
    if success {
        println!("{} {}", "[OK]".green().bold(), target);
    } else {
        println!("{} {}", "[FAILED]".red().bold(), target);
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}
