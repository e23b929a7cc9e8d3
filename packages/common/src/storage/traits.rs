use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::key::BlobKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Key-addressed, write-once blob storage.
///
/// Keys are minted up front (see [`BlobKey::mint`]) and handed to clients as
/// upload targets; storing to an occupied key fails with `AlreadyExists`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under the given key.
    async fn put(&self, key: &BlobKey, data: &[u8]) -> Result<u64, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(key, reader).await
    }

    /// Store data from an async reader under the given key.
    ///
    /// Returns the number of bytes written.
    async fn put_stream(&self, key: &BlobKey, reader: BoxReader) -> Result<u64, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, key: &BlobKey) -> Result<BoxReader, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Get the size of a blob in bytes.
    async fn size(&self, key: &BlobKey) -> Result<u64, StorageError>;
}
