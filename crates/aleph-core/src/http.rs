//! HTTP transport seam
//!
//! The gateway builds requests and interprets responses; the transport only
//! moves bytes. Keeping the seam a trait lets tests count and inspect calls
//! without a network.

use std::time::Duration;

use async_trait::async_trait;

/// Fixed identifying user agent sent with every API call.
pub const USER_AGENT: &str = "Aleph Alpha integration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Decrypted API key, held only for the duration of the call.
    pub bearer_token: String,
    /// Serialized JSON body; GET requests carry none.
    pub body: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// A transport-level failure: timeout, connection refused, TLS trouble.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    /// Parsed response body, when the failure carried one.
    pub body: Option<serde_json::Value>,
}

impl TransportError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            body: None,
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Production transport. A fresh `reqwest::Client` is built per call: the
/// timeout is per-request configuration and no state crosses calls, so
/// concurrent callers never contend.
pub struct ReqwestTransport;

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(request.timeout)
            .build()
            .map_err(TransportError::from_reqwest)?;

        let builder = match request.method {
            HttpMethod::Get => client.get(&request.url),
            HttpMethod::Post => client.post(&request.url),
        };
        let mut builder = builder
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", request.bearer_token),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(TransportError::from_reqwest)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(TransportError::from_reqwest)?;

        Ok(TransportResponse { status, body })
    }
}
