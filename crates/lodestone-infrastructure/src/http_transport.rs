//! reqwest-backed [`ApiTransport`].

use async_trait::async_trait;
use lodestone_core::api::{ApiRequest, ApiResponse, ApiTransport, FormField, HttpMethod, RequestBody};
use lodestone_core::config::ClientConfig;
use lodestone_core::{LodestoneError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};

/// Sends requests to the configured base URL.
///
/// Every non-transport outcome, including 4xx and 5xx, comes back as an
/// [`ApiResponse`]; only connection-level failures become errors.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LodestoneError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn multipart(fields: Vec<FormField>) -> Result<Form> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name, value),
            FormField::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                let mut part = Part::bytes(bytes).file_name(filename);
                if let Some(content_type) = content_type {
                    part = part.mime_str(&content_type).map_err(|e| {
                        LodestoneError::validation(format!("Invalid content type '{}': {}", content_type, e))
                    })?;
                }
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

fn header(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(method(request.method), &url);

        if let Some(authorization) = request.authorization() {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.multipart(multipart(fields)?),
        };

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %request.method, url = %url, error = %e, "request did not complete");
            LodestoneError::network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let content_type = header(response.headers(), CONTENT_TYPE);
        let content_disposition = header(response.headers(), CONTENT_DISPOSITION);
        let body = response
            .bytes()
            .await
            .map_err(|e| LodestoneError::network(format!("Failed to read response body: {}", e)))?;

        Ok(ApiResponse {
            status,
            content_type,
            content_disposition,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::session::Credential;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned response and hands back the raw request text.
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&received).into_owned()
        });

        (base_url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn transport(base_url: &str) -> ReqwestTransport {
        ReqwestTransport::new(&ClientConfig::default().with_base_url(base_url)).unwrap()
    }

    #[tokio::test]
    async fn test_json_request_with_bearer() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
        )
        .await;

        let mut request = ApiRequest::new(
            HttpMethod::Post,
            "/api/v1/semantic/query",
            RequestBody::Json(json!({"query": "x"})),
        );
        request.credential = Some(Credential::new("abc"));

        let response = transport(&base_url).send(request).await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert!(raw.starts_with("POST /api/v1/semantic/query HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer abc"));
        assert!(raw.contains(r#"{"query":"x"}"#));
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 9\r\nconnection: close\r\n\r\nnot found",
        )
        .await;

        let request = ApiRequest::new(HttpMethod::Get, "/api/v1/files/7/download", RequestBody::Empty);
        let response = transport(&base_url).send(request).await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.text(), "not found");
        assert!(!raw.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_multipart_upload_and_disposition() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-disposition: attachment; filename=\"notes.txt\"\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let request = ApiRequest::new(
            HttpMethod::Post,
            "api/v1/files/upload",
            RequestBody::Form(vec![FormField::File {
                name: "file".to_string(),
                filename: "notes.txt".to_string(),
                content_type: Some("text/plain".to_string()),
                bytes: b"hello".to_vec(),
            }]),
        );
        let response = transport(&base_url).send(request).await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(response.suggested_filename().as_deref(), Some("notes.txt"));
        assert!(raw.starts_with("POST /api/v1/files/upload HTTP/1.1"));
        assert!(raw.contains("multipart/form-data"));
        assert!(raw.contains(r#"name="file"; filename="notes.txt""#));
        assert!(raw.contains("hello"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let request = ApiRequest::new(HttpMethod::Get, "/api/v1/auth/me", RequestBody::Empty);
        let err = transport(&base_url).send(request).await.unwrap_err();

        assert!(err.is_network());
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ReqwestTransport::new(&ClientConfig::default().with_base_url("localhost:8000")).is_err());
    }

    #[test]
    fn test_url_joining() {
        let transport = transport("http://localhost:8000/");
        assert_eq!(transport.base_url(), "http://localhost:8000");
        assert_eq!(transport.url("/api/v1/files/"), "http://localhost:8000/api/v1/files/");
    }
}
