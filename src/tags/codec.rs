//! Comment + tags overlay stored in a single comment field.
//!
//! Encoded form: `comment && tag1; tag2`. Without tags the field is just the
//! comment. Decoding splits at the first separator, so a comment that itself
//! contains ` && ` is read back with part of it as tags.

use serde::Serialize;

/// Separates the user comment from the tag block.
pub const SEPARATOR: &str = " && ";

/// Separates tags inside the tag block.
const TAG_DELIMITER: char = ';';

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TagError {
    #[error("tag '{0}' contains the reserved separator \"&&\"")]
    ReservedSeparator(String),
}

/// Decoded comment field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagOverlay {
    pub comment: String,
    pub tags: Vec<String>,
}

impl TagOverlay {
    /// Case-insensitive membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }

    pub fn encode(&self) -> Result<String, TagError> {
        encode(&self.comment, &self.tags)
    }
}

/// Decode a raw comment field.
pub fn decode(raw: &str) -> TagOverlay {
    match raw.split_once(SEPARATOR) {
        None => TagOverlay {
            comment: raw.to_string(),
            tags: Vec::new(),
        },
        Some((comment, block)) => TagOverlay {
            comment: comment.to_string(),
            tags: block
                .split(TAG_DELIMITER)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        },
    }
}

/// Encode a comment and tags into one field.
///
/// Fails if any tag contains [`SEPARATOR`]; blank tags are dropped.
pub fn encode<S: AsRef<str>>(comment: &str, tags: &[S]) -> Result<String, TagError> {
    let mut kept = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref();
        validate_tag(tag)?;
        let trimmed = tag.trim();
        if !trimmed.is_empty() {
            kept.push(trimmed);
        }
    }

    if comment.contains(SEPARATOR) {
        tracing::warn!(
            "Comment '{}' contains the tag separator and will not decode back intact",
            comment
        );
    }

    if kept.is_empty() {
        Ok(comment.to_string())
    } else {
        Ok(format!("{}{}{}", comment, SEPARATOR, kept.join("; ")))
    }
}

/// Reject tags that would break decoding.
pub fn validate_tag(tag: &str) -> Result<(), TagError> {
    if tag.contains(SEPARATOR) {
        Err(TagError::ReservedSeparator(tag.to_string()))
    } else {
        Ok(())
    }
}

/// Swap the tag block of a raw field, keeping the user comment.
pub fn replace_tags<S: AsRef<str>>(raw: &str, tags: &[S]) -> Result<String, TagError> {
    encode(&decode(raw).comment, tags)
}

/// Whether the user part of an encoded field contains the separator.
///
/// Only detectable when the raw field ends up with an extra split; a comment
/// with a separator and no real tags is indistinguishable from tagged text.
pub fn is_ambiguous(raw: &str) -> bool {
    raw.split_once(SEPARATOR)
        .is_some_and(|(_, block)| block.contains(SEPARATOR))
}
