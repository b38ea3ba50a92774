//! Outbound API layer.
//!
//! Every request to the Lodestone service goes through [`ApiGateway`], which
//! attaches the bearer credential and folds failures into [`LodestoneError`].
//! The network itself sits behind the [`ApiTransport`] trait so the gateway
//! can be driven by `reqwest` in production and by a scripted transport in tests.
//!
//! [`LodestoneError`]: crate::error::LodestoneError

mod gateway;
mod request;
mod transport;

pub use gateway::{ApiGateway, BinaryPayload};
pub use request::{ApiRequest, ApiResponse, FormField, HttpMethod, RequestBody};
pub use transport::ApiTransport;

/// Service paths, relative to the configured base URL.
pub mod endpoints {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const PROFILE: &str = "/api/v1/auth/me";
    pub const FILES: &str = "/api/v1/files/";
    pub const UPLOAD: &str = "/api/v1/files/upload";
    pub const SEMANTIC_QUERY: &str = "/api/v1/semantic/query";

    pub fn file(id: i64) -> String {
        format!("/api/v1/files/{}", id)
    }

    pub fn file_download(id: i64) -> String {
        format!("/api/v1/files/{}/download", id)
    }
}
