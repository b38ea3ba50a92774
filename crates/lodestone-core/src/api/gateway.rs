//! ApiGateway - single entry point for calls to the Lodestone service.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::request::{ApiRequest, ApiResponse, HttpMethod, RequestBody};
use super::transport::ApiTransport;
use crate::error::{LodestoneError, Result};
use crate::session::Credential;

/// Binary download payload returned by [`ApiGateway::call_binary`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryPayload {
    pub bytes: Vec<u8>,
    pub suggested_filename: Option<String>,
    pub content_type: Option<String>,
}

/// Wraps every outbound request.
///
/// The gateway never touches session or error state: it attaches the
/// credential it is handed, executes one attempt and reports the outcome.
/// Callers decide what a failure means for their flow.
#[derive(Clone)]
pub struct ApiGateway {
    transport: Arc<dyn ApiTransport>,
}

impl ApiGateway {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Executes a request and returns the body parsed as JSON.
    ///
    /// An empty success body yields `Value::Null`.
    pub async fn call(
        &self,
        path: &str,
        method: HttpMethod,
        body: RequestBody,
        credential: Option<&Credential>,
    ) -> Result<Value> {
        let response = self.execute(path, method, body, credential).await?;

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Executes a request and decodes the JSON body into `T`.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        path: &str,
        method: HttpMethod,
        body: RequestBody,
        credential: Option<&Credential>,
    ) -> Result<T> {
        let value = self.call(path, method, body, credential).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Executes a GET and returns the raw body for local save.
    pub async fn call_binary(&self, path: &str, credential: Option<&Credential>) -> Result<BinaryPayload> {
        let response = self
            .execute(path, HttpMethod::Get, RequestBody::Empty, credential)
            .await?;

        Ok(BinaryPayload {
            suggested_filename: response.suggested_filename(),
            content_type: response.content_type,
            bytes: response.body,
        })
    }

    async fn execute(
        &self,
        path: &str,
        method: HttpMethod,
        body: RequestBody,
        credential: Option<&Credential>,
    ) -> Result<ApiResponse> {
        let mut request = ApiRequest::new(method, path, body);
        request.credential = credential.cloned();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(%method, path, error = %e, "request failed before a response arrived");
                return Err(e);
            }
        };

        tracing::debug!(
            %method,
            path,
            status = response.status,
            authenticated = credential.is_some(),
            "api call completed"
        );

        if !response.is_success() {
            return Err(LodestoneError::api(response.status, response.failure_message()));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    fn gateway(transport: &Arc<ScriptedTransport>) -> ApiGateway {
        ApiGateway::new(transport.clone())
    }

    #[tokio::test]
    async fn test_attaches_bearer_only_when_credential_present() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(HttpMethod::Get, "/api/v1/auth/me", ApiResponse::json(200, &json!({})));
        transport.respond(HttpMethod::Get, "/api/v1/auth/me", ApiResponse::json(200, &json!({})));
        let gateway = gateway(&transport);

        let credential = Credential::new("tok-1");
        gateway
            .call("/api/v1/auth/me", HttpMethod::Get, RequestBody::Empty, Some(&credential))
            .await
            .unwrap();
        gateway
            .call("/api/v1/auth/me", HttpMethod::Get, RequestBody::Empty, None)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].authorization(), Some("Bearer tok-1".to_string()));
        assert_eq!(requests[1].authorization(), None);
    }

    #[tokio::test]
    async fn test_non_success_maps_to_api_error_with_body_text() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            HttpMethod::Post,
            "/api/v1/auth/register",
            ApiResponse::new(400, "Email already registered"),
        );
        transport.respond(HttpMethod::Get, "/api/v1/files/", ApiResponse::empty(500));

        let gateway = gateway(&transport);
        let err = gateway
            .call("/api/v1/auth/register", HttpMethod::Post, RequestBody::Json(json!({})), None)
            .await
            .unwrap_err();
        assert_eq!(err, LodestoneError::api(400, "Email already registered"));

        let err = gateway
            .call("/api/v1/files/", HttpMethod::Get, RequestBody::Empty, None)
            .await
            .unwrap_err();
        assert_eq!(err, LodestoneError::api(500, "API call failed"));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(HttpMethod::Delete, "/api/v1/files/3", ApiResponse::empty(204));

        let value = gateway(&transport)
            .call("/api/v1/files/3", HttpMethod::Delete, RequestBody::Empty, None)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail(HttpMethod::Get, "/api/v1/files/", "connection refused");

        let err = gateway(&transport)
            .call("/api/v1/files/", HttpMethod::Get, RequestBody::Empty, None)
            .await
            .unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_call_binary_returns_bytes_and_suggested_name() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            HttpMethod::Get,
            "/api/v1/files/7/download",
            ApiResponse::new(200, vec![0x25, 0x50, 0x44, 0x46])
                .with_content_type("application/pdf")
                .with_content_disposition("attachment; filename=\"report.pdf\""),
        );

        let payload = gateway(&transport)
            .call_binary("/api/v1/files/7/download", None)
            .await
            .unwrap();
        assert_eq!(payload.bytes, b"%PDF".to_vec());
        assert_eq!(payload.suggested_filename.as_deref(), Some("report.pdf"));
        assert_eq!(payload.content_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_serialization_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(HttpMethod::Get, "/api/v1/files/", ApiResponse::new(200, "<html>"));

        let err = gateway(&transport)
            .call("/api/v1/files/", HttpMethod::Get, RequestBody::Empty, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LodestoneError::Serialization { .. }));
    }
}
