use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;

/// An uploaded file received from a client, held in memory until stored
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Object key under `folder`, unique per upload, keeping the original extension
    pub fn object_path(&self, folder: &str) -> String {
        let extension = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

        match extension {
            Some(ext) => format!("{}/{}.{}", folder, Uuid::now_v7(), ext),
            None => format!("{}/{}", folder, Uuid::now_v7()),
        }
    }
}

/// Opaque blob store: accepts a file, returns the URL it can be fetched from.
///
/// Failures and timeouts surface as `AppError::ExternalServiceError`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, folder: &str, file: MediaFile) -> Result<String>;
}
