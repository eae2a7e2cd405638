//! Markdown files with a YAML frontmatter block.
//!
//! Stored layout: `---\n<yaml>---\n\n<body>\n`.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::content::models::Document;
use crate::error::AppError;

const DELIMITER: &str = "---";

/// Errors that can occur when reading or writing frontmatter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("document does not start with a frontmatter block")]
    Missing,

    #[error("unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("failed to serialize frontmatter: {0}")]
    Serialize(String),
}

impl From<FrontmatterError> for AppError {
    fn from(err: FrontmatterError) -> Self {
        AppError::Internal(format!("Invalid document: {err}"))
    }
}

/// Serialize a frontmatter value and body into the stored file format.
pub fn render<F: Serialize>(frontmatter: &F, body: &str) -> Result<String, FrontmatterError> {
    let mut yaml = serde_yaml::to_string(frontmatter)
        .map_err(|e| FrontmatterError::Serialize(e.to_string()))?;
    if !yaml.ends_with('\n') {
        yaml.push('\n');
    }
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{body}\n"))
}

/// Strip a leading UTF-8 byte order mark and turn CRLF line endings into LF.
///
/// [`split`] only understands LF files, so every reader goes through this first.
pub fn normalize(source: &str) -> Cow<'_, str> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    if source.contains("\r\n") {
        Cow::Owned(source.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(source)
    }
}

/// Split a stored file into its raw YAML block and its body.
///
/// The blank separator line after the closing delimiter and the single
/// trailing newline written by [`render`] are not part of the body.
pub fn split(source: &str) -> Result<(&str, &str), FrontmatterError> {
    let rest = source
        .strip_prefix("---\n")
        .ok_or(FrontmatterError::Missing)?;

    let (yaml, after) = match rest.strip_prefix(DELIMITER) {
        Some(after) if after.is_empty() || after.starts_with('\n') => ("", after),
        _ => {
            let close = rest
                .match_indices("\n---")
                .map(|(idx, _)| idx)
                .find(|idx| {
                    let tail = &rest[idx + 4..];
                    tail.is_empty() || tail.starts_with('\n')
                })
                .ok_or(FrontmatterError::Unclosed)?;
            (&rest[..close + 1], &rest[close + 4..])
        }
    };

    let after = after.strip_prefix('\n').unwrap_or(after);
    let body = after.strip_prefix('\n').unwrap_or(after);
    let body = body.strip_suffix('\n').unwrap_or(body);
    Ok((yaml, body))
}

/// Parse a stored file into typed frontmatter and body.
pub fn parse<F: DeserializeOwned>(source: &str) -> Result<Document<F>, FrontmatterError> {
    let source = normalize(source);
    let (yaml, body) = split(&source)?;
    let frontmatter = serde_yaml::from_str(yaml)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    Ok(Document {
        frontmatter,
        body: body.to_string(),
    })
}
