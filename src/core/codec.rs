//! Codec - Markdown document encoding for entries
//!
//! An entry is stored as a Markdown file with a `---`-delimited header block
//! (title, section, category, tags, created_at), a blank line, then the body
//! unmodified.
//!
//! The header stays parseable by simple line-oriented scanning - no Markdown
//! parser involved - so entries written by earlier header schemas still
//! decode as long as they carry at least a title and a timestamp:
//!
//! - `name:` is accepted as an alias for `title:`
//! - `date: YYYY-MM-DD` is accepted as an alias for `created_at:`
//! - `tags: [a, b]` (bracketed) is accepted alongside `tags: a, b`
//! - unknown keys are ignored

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use super::entry::{normalize_tags, Entry, Section};

const DELIMITER: &str = "---";

/// Why a document failed to decode
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("missing metadata header")]
    MissingHeader,
    #[error("unterminated metadata header")]
    UnterminatedHeader,
    #[error("missing or empty {0} in header")]
    MissingField(&'static str),
    #[error("unparseable timestamp: {0}")]
    BadTimestamp(String),
}

/// Serialize an entry to a Markdown document
pub fn encode(entry: &Entry) -> String {
    let mut doc = String::new();
    doc.push_str(DELIMITER);
    doc.push('\n');
    doc.push_str(&format!("title: {}\n", entry.title));
    doc.push_str(&format!("section: {}\n", entry.section));
    if let Some(category) = &entry.category {
        doc.push_str(&format!("category: {}\n", category));
    }
    if !entry.tags.is_empty() {
        let tags: Vec<&str> = entry.tags.iter().map(|t| t.as_str()).collect();
        doc.push_str(&format!("tags: {}\n", tags.join(", ")));
    }
    doc.push_str(&format!("created_at: {}\n", entry.created_at.to_rfc3339()));
    doc.push_str(DELIMITER);
    doc.push_str("\n\n");
    doc.push_str(&entry.body);
    doc
}

/// Deserialize a Markdown document into an entry
///
/// `section` is the caller's hint derived from the file's location in the
/// tree; a `section:` header field, when present and valid, wins over it.
pub fn decode(document: &str, section: Section) -> Result<Entry, DecodeError> {
    let mut rest = document;

    match next_line(&mut rest) {
        Some(line) if line.trim() == DELIMITER => {}
        _ => return Err(DecodeError::MissingHeader),
    }

    let mut title: Option<String> = None;
    let mut category: Option<String> = None;
    let mut tags = Default::default();
    let mut created_at: Option<DateTime<Utc>> = None;
    let mut section = section;
    let mut terminated = false;

    while let Some(line) = next_line(&mut rest) {
        if line.trim() == DELIMITER {
            terminated = true;
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "title" | "name" => title = Some(unquote(value).to_string()),
            "section" => {
                // Old or foreign values fall back to the caller's hint
                if let Ok(parsed) = value.parse::<Section>() {
                    section = parsed;
                }
            }
            "category" => {
                if !value.is_empty() {
                    category = Some(value.to_string());
                }
            }
            "tags" => {
                let list = value.trim_start_matches('[').trim_end_matches(']');
                tags = normalize_tags(list.split(','));
            }
            "created_at" | "date" => created_at = Some(parse_timestamp(value)?),
            _ => {} // unknown keys from other schema versions
        }
    }

    if !terminated {
        return Err(DecodeError::UnterminatedHeader);
    }

    let title = title
        .filter(|t| !t.is_empty())
        .ok_or(DecodeError::MissingField("title"))?;
    let created_at = created_at.ok_or(DecodeError::MissingField("created_at"))?;

    // Exactly one blank line separates header from body
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    Ok(Entry {
        section,
        title,
        body: body.to_string(),
        tags,
        category,
        created_at,
    })
}

/// Pop one line off `rest`, byte-exact so the body survives untouched
fn next_line<'a>(rest: &mut &'a str) -> Option<&'a str> {
    if rest.is_empty() {
        return None;
    }
    let line = match rest.find('\n') {
        Some(i) => {
            let line = &rest[..i];
            *rest = &rest[i + 1..];
            line
        }
        None => {
            let line = *rest;
            *rest = "";
            line
        }
    };
    Some(line.trim_end_matches('\r'))
}

/// Accept RFC 3339 or the older date-only form
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DecodeError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(DecodeError::BadTimestamp(value.to_string()))
}

/// Older schemas quoted title values
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
