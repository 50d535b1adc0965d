use std::fmt;

/// Errors that can occur during blob storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested blob was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The provided file reference is malformed or unsafe.
    InvalidFileRef(String),
    /// The upload's content type is not on the allow-list.
    RejectedContentType(String),
    /// The blob exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(file_ref) => write!(f, "blob not found: {file_ref}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidFileRef(msg) => write!(f, "invalid file reference: {msg}"),
            Self::RejectedContentType(content_type) => {
                write!(f, "content type not allowed: {content_type}")
            }
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "blob exceeds size limit ({actual} > {limit} bytes)")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
