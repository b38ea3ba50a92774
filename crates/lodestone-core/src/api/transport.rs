//! Transport seam between the gateway and the network.

use async_trait::async_trait;

use super::request::{ApiRequest, ApiResponse};
use crate::error::Result;

/// Sends a fully built request and returns the raw response.
///
/// Implementations must return `Ok` for every response the service produced,
/// whatever its status; status interpretation belongs to the gateway. Only a
/// request that could not be sent or completed maps to
/// [`LodestoneError::Network`](crate::error::LodestoneError::Network).
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}
