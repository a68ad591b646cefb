//! YAML frontmatter splitting, parsing and in-place field updates.
//!
//! Handles the `---` delimited header block at the very top of a markdown
//! file:
//! ```markdown
//! ---
//! title: Weekly review
//! created: 2025-02-10T09:15
//! modified: 2025-02-11T17:40
//! hash: 4f1c...
//! ---
//!
//! Body content here
//! ```
//!
//! The opening delimiter must be the first line of the file. A `---` line
//! further down is ordinary body text.

use serde_yaml::{Mapping, Value};

use crate::error::StampError;

/// The header block delimiter line.
pub const DELIMITER: &str = "---";

fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == DELIMITER
}

/// Split a markdown file into frontmatter YAML and body content.
///
/// Returns `Some((yaml, body))` where `yaml` is the raw text between the
/// delimiter lines and `body` is everything after the closing delimiter
/// line. Returns `None` when the file does not open with a complete header
/// block.
#[must_use]
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let first_end = content.find('\n')?;
    if !is_delimiter(&content[..first_end]) {
        return None;
    }

    let yaml_start = first_end + 1;
    let mut pos = yaml_start;
    loop {
        let line_end = content[pos..].find('\n').map(|i| pos + i);
        let line = &content[pos..line_end.unwrap_or(content.len())];
        if is_delimiter(line) {
            let yaml = &content[yaml_start..pos];
            let body = line_end.map_or("", |end| &content[end + 1..]);
            return Some((yaml, body));
        }
        pos = line_end? + 1;
    }
}

/// Strip a leading header block, returning the body verbatim.
///
/// Content without a header block is returned unchanged.
#[must_use]
pub fn extract_body(content: &str) -> &str {
    split_frontmatter(content).map_or(content, |(_, body)| body)
}

/// Parse the YAML text of a header block into a key-value mapping.
///
/// # Errors
///
/// Returns [`StampError::Parse`] if the YAML is invalid or its top level is
/// not a mapping.
pub fn parse_header(yaml: &str) -> Result<Mapping, StampError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(yaml).map_err(|e| StampError::Parse(e.to_string()))? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(StampError::Parse(format!(
            "expected a key-value mapping, found {}",
            value_kind(&other)
        ))),
    }
}

/// Read the header mapping of a whole file. Files without a header block
/// have an empty mapping.
///
/// # Errors
///
/// Returns [`StampError::Parse`] if the header block is malformed.
pub fn read_header(content: &str) -> Result<Mapping, StampError> {
    match split_frontmatter(content) {
        Some((yaml, _)) => parse_header(yaml),
        None => Ok(Mapping::new()),
    }
}

/// Set string fields in the header block of `content`.
///
/// Only the lines belonging to the given keys are touched: an existing
/// top-level entry is replaced in place, a missing one is appended before
/// the closing delimiter. Every other line of the header and the whole body
/// are kept byte-for-byte. A file without a header block gets a new one.
///
/// # Errors
///
/// Returns [`StampError::Parse`] if the existing header is malformed, and
/// [`StampError::Serialization`] if a value cannot be rendered.
pub fn set_header_fields(content: &str, fields: &[(&str, &str)]) -> Result<String, StampError> {
    if fields.is_empty() {
        return Ok(content.to_string());
    }

    let Some((yaml, body)) = split_frontmatter(content) else {
        let mut output = String::with_capacity(content.len() + 160);
        output.push_str(DELIMITER);
        output.push('\n');
        for (key, value) in fields {
            output.push_str(&render_entry(key, value)?);
            output.push('\n');
        }
        output.push_str(DELIMITER);
        output.push('\n');
        output.push_str(content);
        return Ok(output);
    };

    let mut mapping = parse_header(yaml)?;
    let newline = if content.starts_with("---\r\n") { "\r\n" } else { "\n" };

    let mut lines: Vec<String> = yaml.lines().map(str::to_string).collect();
    for (key, value) in fields {
        let entry = render_entry(key, value)?;
        match entry_extent(&lines, key) {
            Some((start, end)) => {
                lines.splice(start..end, [entry]);
            }
            None => lines.push(entry),
        }
    }

    let mut new_yaml = String::with_capacity(yaml.len() + 160);
    for line in &lines {
        new_yaml.push_str(line);
        new_yaml.push_str(newline);
    }

    // Line editing can't follow every YAML layout; fall back to a full
    // re-render when the edited block doesn't hold exactly the new values.
    if !holds_fields(&new_yaml, fields) {
        for (key, value) in fields {
            mapping.insert(Value::from(*key), Value::from(*value));
        }
        new_yaml = serde_yaml::to_string(&mapping)
            .map_err(|e| StampError::Serialization(e.to_string()))?;
        if newline != "\n" {
            new_yaml = new_yaml.replace('\n', newline);
        }
    }

    let mut output = String::with_capacity(new_yaml.len() + body.len() + 10);
    output.push_str(DELIMITER);
    output.push_str(newline);
    output.push_str(&new_yaml);
    output.push_str(DELIMITER);
    output.push_str(newline);
    output.push_str(body);

    Ok(output)
}

/// Render `key: value` as a single YAML line, quoting where YAML needs it.
fn render_entry(key: &str, value: &str) -> Result<String, StampError> {
    let mut entry = Mapping::new();
    entry.insert(Value::from(key), Value::from(value));
    let rendered =
        serde_yaml::to_string(&entry).map_err(|e| StampError::Serialization(e.to_string()))?;
    Ok(rendered.trim_end_matches('\n').to_string())
}

/// Line range `[start, end)` of the top-level entry for `key`, including
/// any indented continuation lines of its value.
fn entry_extent(lines: &[String], key: &str) -> Option<(usize, usize)> {
    let start = lines.iter().position(|line| is_key_line(line, key))?;
    let mut end = start + 1;
    while end < lines.len() {
        let line = &lines[end];
        let continues = line.starts_with(' ') || line.starts_with('\t') || line.starts_with('-');
        if !continues || is_delimiter(line) {
            break;
        }
        end += 1;
    }
    Some((start, end))
}

fn is_key_line(line: &str, key: &str) -> bool {
    let double = format!("\"{key}\"");
    let single = format!("'{key}'");
    [key, double.as_str(), single.as_str()].iter().any(|candidate| {
        line.strip_prefix(candidate)
            .is_some_and(|rest| rest.trim_start_matches([' ', '\t']).starts_with(':'))
    })
}

fn holds_fields(yaml: &str, fields: &[(&str, &str)]) -> bool {
    parse_header(yaml).is_ok_and(|mapping| {
        fields
            .iter()
            .all(|(key, value)| mapping.get(*key) == Some(&Value::from(*value)))
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
