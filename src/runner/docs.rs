//! Parameter descriptions from documentation blocks
//!
//! Understands Google style sections:
//!
//! ```text
//! Args:
//!     target (str): Where to deploy.
//!         Continued on the next line.
//! ```
//!
//! and reST fields (`:param target: Where to deploy.`).

use regex::Regex;
use std::sync::OnceLock;

const SECTION_HEADERS: &[&str] = &["Args:", "Arguments:", "Parameters:", "Params:"];

fn google_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\*{0,2}\w+)\s*(?:\([^)]*\))?\s*:\s*(.*)$").unwrap())
}

fn rest_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^:param\s+(?:[^:]*\s)?(\w+)\s*:\s*(.*)$").unwrap())
}

/// Description of parameter `name` in `doc`, if it documents one
pub fn extract_param_doc(doc: &str, name: &str) -> Option<String> {
    google_param(doc, name)
        .or_else(|| rest_param(doc, name))
        .filter(|text| !text.is_empty())
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn google_param(doc: &str, name: &str) -> Option<String> {
    let mut section_indent: Option<usize> = None;
    let mut item_indent: Option<usize> = None;
    let mut found: Option<Vec<String>> = None;

    for line in doc.lines() {
        let trimmed = line.trim();
        let indent = indent_of(line);

        if SECTION_HEADERS.contains(&trimmed) {
            if found.is_some() {
                break;
            }
            section_indent = Some(indent);
            item_indent = None;
            continue;
        }

        let Some(header) = section_indent else {
            continue;
        };

        if trimmed.is_empty() {
            continue;
        }

        // dedent back to the header level ends the section
        if indent <= header {
            if found.is_some() {
                break;
            }
            section_indent = None;
            continue;
        }

        let item = *item_indent.get_or_insert(indent);

        if indent == item {
            if found.is_some() {
                break;
            }
            if let Some(caps) = google_item().captures(trimmed) {
                if caps[1].trim_start_matches('*') == name {
                    found = Some(vec![caps[2].trim().to_string()]);
                }
            }
        } else if let Some(parts) = found.as_mut() {
            parts.push(trimmed.to_string());
        }
    }

    found.map(|parts| join_description(&parts))
}

fn rest_param(doc: &str, name: &str) -> Option<String> {
    let mut found: Option<Vec<String>> = None;
    let mut field_indent = 0;

    for line in doc.lines() {
        let trimmed = line.trim();

        if let Some(parts) = found.as_mut() {
            if trimmed.is_empty() || trimmed.starts_with(':') || indent_of(line) <= field_indent {
                break;
            }
            parts.push(trimmed.to_string());
            continue;
        }

        if let Some(caps) = rest_field().captures(trimmed) {
            if &caps[1] == name {
                field_indent = indent_of(line);
                found = Some(vec![caps[2].trim().to_string()]);
            }
        }
    }

    found.map(|parts| join_description(&parts))
}

fn join_description(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}
