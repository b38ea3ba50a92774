//! File registry: the mirrored listing and the flows that change it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::model::{DownloadedFile, FileRecord, UploadFile};
use super::sink::BlobSink;
use crate::api::{ApiGateway, FormField, HttpMethod, RequestBody, endpoints};
use crate::error::{LodestoneError, Result};
use crate::error_state::ErrorState;
use crate::session::Credential;

pub const FETCH_FAILED: &str = "Failed to fetch files";
pub const UPLOAD_FAILED: &str = "File upload failed";
pub const DELETE_FAILED: &str = "Failed to delete file";
pub const DOWNLOAD_FAILED: &str = "Download failed";

/// Client-side mirror of the user's uploaded files.
///
/// The collection is kept in the order the service lists it and is only ever
/// replaced wholesale by [`refresh`](Self::refresh). Failures are recorded in
/// the shared [`ErrorState`] and leave the collection untouched.
///
/// [`clear`](Self::clear) starts a new epoch. A listing requested before the
/// clear is discarded when it arrives, so a session that has ended cannot
/// refill the mirror.
pub struct FileRegistry {
    gateway: Arc<ApiGateway>,
    errors: Arc<ErrorState>,
    files: RwLock<Vec<FileRecord>>,
    epoch: AtomicU64,
}

impl FileRegistry {
    pub fn new(gateway: Arc<ApiGateway>, errors: Arc<ErrorState>) -> Self {
        Self {
            gateway,
            errors,
            files: RwLock::new(Vec::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Replaces the collection with the service's current listing.
    pub async fn refresh(&self, credential: &Credential) -> Result<()> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.refresh_in(epoch, credential).await
    }

    async fn refresh_in(&self, epoch: u64, credential: &Credential) -> Result<()> {
        let listing = self
            .gateway
            .call_json::<Vec<FileRecord>>(endpoints::FILES, HttpMethod::Get, RequestBody::Empty, Some(credential))
            .await;

        match listing {
            Ok(files) => {
                let mut held = self.files.write().await;
                if self.epoch.load(Ordering::SeqCst) != epoch {
                    tracing::debug!(count = files.len(), "discarding listing from a cleared registry");
                    return Ok(());
                }
                tracing::debug!(count = files.len(), "file listing refreshed");
                *held = files;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch files");
                self.errors.set(FETCH_FAILED).await;
                Err(e)
            }
        }
    }

    /// Uploads `file` as multipart field `file`, then re-fetches the listing.
    ///
    /// Returns the record the service created. It is not inserted locally;
    /// the listing that follows is the only source of the collection.
    pub async fn upload(&self, file: UploadFile, credential: &Credential) -> Result<FileRecord> {
        if file.filename.trim().is_empty() {
            return Err(LodestoneError::validation("Choose a file to upload"));
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let filename = file.filename.clone();
        let size = file.bytes.len();
        let body = RequestBody::Form(vec![FormField::File {
            name: "file".to_string(),
            filename: file.filename,
            content_type: file.content_type,
            bytes: file.bytes,
        }]);

        let record = match self
            .gateway
            .call_json::<FileRecord>(endpoints::UPLOAD, HttpMethod::Post, body, Some(credential))
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(%filename, error = %e, "upload failed");
                self.errors.set(UPLOAD_FAILED).await;
                return Err(e);
            }
        };

        tracing::info!(%filename, id = record.id, size, "file uploaded");
        // The upload itself succeeded; a failed refresh is reported on its own.
        let _ = self.refresh_in(epoch, credential).await;
        Ok(record)
    }

    /// Deletes `id` on the service, then re-fetches the listing.
    ///
    /// The request is issued even when `id` is not in the local collection.
    pub async fn delete(&self, id: i64, credential: &Credential) -> Result<()> {
        let epoch = self.epoch.load(Ordering::SeqCst);

        if let Err(e) = self
            .gateway
            .call(&endpoints::file(id), HttpMethod::Delete, RequestBody::Empty, Some(credential))
            .await
        {
            tracing::warn!(id, error = %e, "delete failed");
            self.errors.set(DELETE_FAILED).await;
            return Err(e);
        }

        tracing::info!(id, "file deleted");
        let _ = self.refresh_in(epoch, credential).await;
        Ok(())
    }

    /// Downloads `id` and hands it to `sink` as a blob named `filename`.
    ///
    /// An empty `filename` falls back to the server's suggestion, then to
    /// `file-{id}`. The registry itself is never changed.
    pub async fn download(
        &self,
        id: i64,
        filename: &str,
        credential: &Credential,
        sink: &dyn BlobSink,
    ) -> Result<DownloadedFile> {
        let payload = match self
            .gateway
            .call_binary(&endpoints::file_download(id), Some(credential))
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(id, error = %e, "download failed");
                self.errors.set(DOWNLOAD_FAILED).await;
                return Err(e);
            }
        };

        let filename = Some(filename.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or(payload.suggested_filename)
            .unwrap_or_else(|| format!("file-{}", id));

        let file = DownloadedFile {
            filename,
            content_type: payload.content_type,
            bytes: payload.bytes,
        };

        if let Err(e) = sink.save(&file).await {
            tracing::warn!(id, filename = %file.filename, error = %e, "saving download failed");
            self.errors.set(DOWNLOAD_FAILED).await;
            return Err(e);
        }

        tracing::info!(id, filename = %file.filename, size = file.bytes.len(), "file downloaded");
        Ok(file)
    }

    /// The mirrored collection, in service order.
    pub async fn files(&self) -> Vec<FileRecord> {
        self.files.read().await.clone()
    }

    pub async fn find(&self, id: i64) -> Option<FileRecord> {
        self.files.read().await.iter().find(|f| f.id == id).cloned()
    }

    /// Drops the mirror when the session ends.
    pub async fn clear(&self) {
        let mut files = self.files.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        files.clear();
    }
}
