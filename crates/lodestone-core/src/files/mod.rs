//! File management flow.
//!
//! [`FileRegistry`] mirrors the user's files. It never patches the mirror:
//! every successful upload or delete is followed by a full re-fetch, so the
//! list always reflects what the service reports.

mod model;
mod registry;
mod sink;

pub use model::{DownloadedFile, FileRecord, UploadFile};
pub use registry::{DELETE_FAILED, DOWNLOAD_FAILED, FETCH_FAILED, FileRegistry, UPLOAD_FAILED};
pub use sink::BlobSink;
