//! Destination for downloaded files.

use async_trait::async_trait;

use super::model::DownloadedFile;
use crate::error::Result;

/// Saves a downloaded blob on behalf of the presentation layer.
#[async_trait]
pub trait BlobSink: Send + Sync {
    async fn save(&self, file: &DownloadedFile) -> Result<()>;
}
