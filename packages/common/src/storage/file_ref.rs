use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StorageError;

/// Longest accepted reference string. Generated references are far shorter;
/// the cap only guards `parse` against hostile input.
const MAX_REF_LEN: usize = 512;

/// Longest filename suffix kept when minting a reference.
const MAX_NAME_LEN: usize = 64;

/// An opaque, validated handle to a stored blob.
///
/// References are minted per upload as `{uuid}-{sanitized filename}`, so two
/// uploads of identical bytes still get distinct handles and deleting one
/// never invalidates the other.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FileRef(String);

impl FileRef {
    /// Mint a fresh reference for an uploaded file.
    pub fn generate(original_filename: &str) -> Self {
        let name = sanitize_filename(original_filename);
        Self(format!("{}-{name}", Uuid::new_v4()))
    }

    /// Parse an externally supplied reference string.
    ///
    /// A reference is used directly as a filename inside the store's base
    /// directory, so anything that could escape it is rejected here.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidFileRef("empty reference".into()));
        }
        if s.len() > MAX_REF_LEN {
            return Err(StorageError::InvalidFileRef(format!(
                "reference exceeds {MAX_REF_LEN} characters"
            )));
        }
        if s.contains('/') || s.contains('\\') {
            return Err(StorageError::InvalidFileRef(
                "path separators are not allowed".into(),
            ));
        }
        if s.chars().any(|c| c.is_ascii_control()) {
            return Err(StorageError::InvalidFileRef(
                "control characters are not allowed".into(),
            ));
        }
        if s.starts_with('.') {
            return Err(StorageError::InvalidFileRef(
                "references must not start with '.'".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileRef({})", self.0)
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for FileRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FileRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Reduce an upload's filename to a safe suffix for the stored name.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "upload".to_string();
    }

    // Keep the tail so the extension survives truncation.
    if cleaned.len() > MAX_NAME_LEN {
        cleaned[cleaned.len() - MAX_NAME_LEN..].to_string()
    } else {
        cleaned.to_string()
    }
}
