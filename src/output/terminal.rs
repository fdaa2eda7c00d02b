//! Terminal output utilities.
//!
//! Provides formatting helpers for the summary blocks.

use colored::Colorize;

/// Format `label: value` indented by `depth` tabs, with a trailing newline.
///
/// # Arguments
/// * `label` - The field label
/// * `value` - The value to show
/// * `depth` - Number of leading tabs
pub fn format_field<T: ToString>(label: &str, value: T, depth: usize) -> String {
    let indent = "\t".repeat(depth);
    format!("{indent}{label}: {}\n", value.to_string())
}

/// Value to print for an optional field.
pub fn or_none<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

/// Highlight the `Name:` line of each block.
pub fn highlight(rendered: &str) -> String {
    rendered
        .lines()
        .map(|line| {
            if line.starts_with("Name: ") {
                line.bold().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
