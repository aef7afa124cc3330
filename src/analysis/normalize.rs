//! Markdown clean-up of generated reports
//!
//! Providers tend to glue pipe tables to the surrounding text, which breaks
//! rendering in most Markdown viewers. The rules applied here:
//! - A heading directly followed by a table row gets a blank line
//! - Consecutive table rows are separated by one blank line
//! - A table row followed by a non-heading text line gets a blank line
//! - Runs of three or more newlines collapse to one blank line

use regex::Regex;
use std::sync::OnceLock;

fn heading_before_table() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^(#{1,6}[^\n]*)\n(\|)").expect("valid regex"))
}

fn blank_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

fn is_table_row(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('|') && line.ends_with('|')
}

/// Trims the report and reformats its pipe tables
pub fn normalize_report(text: &str) -> String {
    let spaced = heading_before_table().replace_all(text.trim(), "${1}\n\n${2}");

    let lines: Vec<&str> = spaced.split('\n').collect();
    let mut fixed = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        fixed.push(*line);

        if !is_table_row(line) {
            continue;
        }
        if let Some(next) = lines.get(i + 1) {
            let next_is_text = !next.trim().is_empty() && !next.starts_with('#');
            if is_table_row(next) || next_is_text {
                fixed.push("");
            }
        }
    }

    blank_runs()
        .replace_all(&fixed.join("\n"), "\n\n")
        .into_owned()
}
