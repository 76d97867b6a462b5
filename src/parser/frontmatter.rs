//! Markdown frontmatter parsing
//!
//! Content files are markdown with a YAML frontmatter block delimited by
//! `---` lines. The body is opaque to the sync engine; rendering belongs
//! to the web frontend.

use std::path::Path;

use crate::domain::Frontmatter;
use crate::error::{Result, SyncError};

/// Splits a markdown document into parsed frontmatter and raw body.
///
/// A document without a frontmatter block yields a default frontmatter and
/// the whole text as body; whether that is acceptable is the per-type
/// parser's call (most types require `title`).
pub fn parse_document(path: &Path, content: &str) -> Result<(Frontmatter, String)> {
    let trimmed = content.trim_start_matches('\u{feff}');

    if !trimmed.trim_start().starts_with("---") {
        return Ok((Frontmatter::default(), trimmed.to_string()));
    }

    let after_open = match trimmed.trim_start().strip_prefix("---") {
        Some(rest) => rest,
        None => return Ok((Frontmatter::default(), trimmed.to_string())),
    };

    let end = after_open.find("\n---").ok_or_else(|| {
        SyncError::parsing(path, "frontmatter opened with '---' but never closed")
    })?;

    let yaml = &after_open[..end];
    let body = after_open[end + 4..]
        .trim_start_matches('-')
        .trim_start_matches('\n');

    let frontmatter: Frontmatter = serde_yaml::from_str(yaml)
        .map_err(|e| SyncError::parsing(path, format!("invalid frontmatter YAML: {}", e)))?;

    Ok((frontmatter, body.to_string()))
}

/// Requires a `title` key, returning a parsing error naming the file
pub fn require_title(path: &Path, frontmatter: &Frontmatter) -> Result<String> {
    frontmatter
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| SyncError::parsing(path, "missing required frontmatter key 'title'"))
}
