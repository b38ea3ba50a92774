//! Concrete adapters for the Lodestone client: the HTTP transport, the
//! credential file, configuration loading and the download directory.

pub mod blob_sink;
pub mod config_service;
pub mod credential_store;
pub mod http_transport;
pub mod paths;
pub mod storage;

pub use crate::blob_sink::DirectoryBlobSink;
pub use crate::config_service::ConfigService;
pub use crate::credential_store::FileCredentialStore;
pub use crate::http_transport::ReqwestTransport;
pub use crate::paths::LodestonePaths;
