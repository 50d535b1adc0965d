pub mod storage;

pub use storage::{BlobStore, BoxReader, FileRef, StorageError};
