use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, BufReader};

use super::error::StorageError;
use super::file_ref::FileRef;
use super::traits::{BlobStore, BoxReader};

/// Filesystem-backed blob store.
///
/// Blobs live as flat files named by their reference under `base_path`.
/// Writes stream through a `.tmp` staging file and are renamed into place,
/// so a partially written upload is never visible under its final name.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
    allowed_types: Vec<String>,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(
        base_path: PathBuf,
        max_size: u64,
        allowed_types: &[&str],
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
            allowed_types: allowed_types.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Compute the filesystem path for a reference.
    fn blob_path(&self, file_ref: &FileRef) -> PathBuf {
        self.base_path.join(file_ref.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    fn accepts(&self, content_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == content_type)
    }

    async fn save(
        &self,
        mut reader: BoxReader,
        original_filename: &str,
        content_type: &str,
    ) -> Result<FileRef, StorageError> {
        if !self.accepts(content_type) {
            return Err(StorageError::RejectedContentType(content_type.to_string()));
        }

        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(temp_file);
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            if let Err(e) = tokio::io::AsyncWriteExt::write_all(&mut temp_file, &buf[..n]).await {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
        }

        tokio::io::AsyncWriteExt::flush(&mut temp_file).await?;
        drop(temp_file);

        let file_ref = FileRef::generate(original_filename);
        let blob_path = self.blob_path(&file_ref);

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(file_ref)
    }

    async fn open(&self, file_ref: &FileRef) -> Result<BoxReader, StorageError> {
        let blob_path = self.blob_path(file_ref);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(file_ref.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, file_ref: &FileRef) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(file_ref);
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn delete(&self, file_ref: &FileRef) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(file_ref);
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
