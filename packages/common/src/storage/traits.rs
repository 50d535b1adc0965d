use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::file_ref::FileRef;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Blob storage keyed by opaque per-upload references.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether the store's allow-list admits this content type.
    fn accepts(&self, content_type: &str) -> bool;

    /// Store an in-memory buffer and return its reference.
    async fn save_bytes(
        &self,
        data: &[u8],
        original_filename: &str,
        content_type: &str,
    ) -> Result<FileRef, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.save(reader, original_filename, content_type).await
    }

    /// Store data from an async reader and return its reference.
    ///
    /// Fails with `RejectedContentType` when the content type is not on the
    /// allow-list and `SizeLimitExceeded` when the stream overruns the cap.
    async fn save(
        &self,
        reader: BoxReader,
        original_filename: &str,
        content_type: &str,
    ) -> Result<FileRef, StorageError>;

    /// Open a blob for streaming reads.
    async fn open(&self, file_ref: &FileRef) -> Result<BoxReader, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, file_ref: &FileRef) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, file_ref: &FileRef) -> Result<bool, StorageError>;
}
