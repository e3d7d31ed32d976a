//! The API gateway
//!
//! Every call resolves the API key fresh from configuration, makes at most
//! one transport call, and reports its outcome as a result mapping. The
//! gateway never returns an error through `Result`: success and failure are
//! both `ApiOutcome` values, and all failures are logged once here, at the
//! point of detection.

use std::sync::{Arc, RwLock};

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::config::{ConfigStore, DEFAULT_COMPLETION_MODEL};
use crate::http::{HttpMethod, HttpTransport, ReqwestTransport, TransportRequest};

const BASE_URL: &str = "https://api.aleph-alpha.com/";
/// Models with this suffix expect an instruction/response-formatted prompt.
const CONTROL_SUFFIX: &str = "-control";

/// Outcome of one API call: a decoded JSON mapping or an error record.
/// Exactly one of the two per call, by construction.
#[derive(Debug, Clone)]
pub enum ApiOutcome {
    Success(Map<String, Value>),
    Failure(ApiFailure),
}

#[derive(Debug, Clone)]
pub struct ApiFailure {
    pub error: String,
    /// Raw provider error body, when one was available.
    pub body: Option<Value>,
}

impl ApiOutcome {
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self::Failure(ApiFailure {
            error: message.into(),
            body: None,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The error message, when this outcome is a failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.error),
        }
    }

    /// Looks up a field of the success mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Success(map) => map.get(key),
            Self::Failure(_) => None,
        }
    }

    /// Renders the host-facing result mapping. Failures carry an `error`
    /// key (and `body` when present); success mappings never do.
    pub fn into_value(self) -> Value {
        match self {
            Self::Success(map) => Value::Object(map),
            Self::Failure(failure) => {
                let mut map = Map::new();
                map.insert("error".to_string(), Value::String(failure.error));
                if let Some(body) = failure.body {
                    map.insert("body".to_string(), body);
                }
                Value::Object(map)
            }
        }
    }
}

/// Gateway to the Aleph Alpha completion API.
pub struct AlephAlphaService {
    config: Arc<RwLock<ConfigStore>>,
    transport: Arc<dyn HttpTransport>,
}

impl AlephAlphaService {
    pub fn new(config: Arc<RwLock<ConfigStore>>) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport))
    }

    pub fn with_transport(
        config: Arc<RwLock<ConfigStore>>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self { config, transport }
    }

    /// Lists the models available to the configured API key. No caching:
    /// one network round trip per invocation.
    pub async fn get_models(&self) -> ApiOutcome {
        self.request("GET", "models_available", None).await
    }

    /// Builds and sends a completion request. Control models get the
    /// instruction/response prompt template; others pass the prompt through
    /// unmodified.
    pub async fn create_completion(&self, prompt: &str, n: u32, max_tokens: u32) -> ApiOutcome {
        let model = {
            let config = match self.config.read() {
                Ok(config) => config,
                Err(_) => return ApiOutcome::failure("Configuration store poisoned"),
            };
            config.completion_model()
        };

        let prompt = if model.ends_with(CONTROL_SUFFIX) {
            format!(" ### Instruction:\n{prompt}\n### Response:")
        } else {
            prompt.to_string()
        };

        self.request(
            "POST",
            "complete",
            Some(json!({
                "model": model,
                "prompt": prompt,
                "maximum_tokens": max_tokens,
                "n": n,
            })),
        )
        .await
    }

    /// Host-facing listing: the default model id alongside the raw
    /// `models_available` outcome.
    pub async fn models_overview(&self) -> Value {
        json!({
            "completion_model": DEFAULT_COMPLETION_MODEL,
            "data": self.get_models().await.into_value(),
        })
    }

    /// Makes an authenticated HTTP request to the Aleph Alpha API.
    ///
    /// `method` must be `GET` or `POST`; anything else is rejected before
    /// the transport is touched, as is a missing API key.
    pub async fn request(&self, method: &str, endpoint: &str, body: Option<Value>) -> ApiOutcome {
        let method = match method {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            _ => return ApiOutcome::failure("Bad HTTP method"),
        };

        let (api_key, timeout) = {
            let config = match self.config.read() {
                Ok(config) => config,
                Err(_) => return ApiOutcome::failure("Configuration store poisoned"),
            };
            let api_key = match config.api_key() {
                Ok(key) => key,
                Err(err) => {
                    warn!(error = %err, "Could not resolve the API key");
                    return ApiOutcome::failure(err.to_string());
                }
            };
            (api_key, config.request_timeout())
        };
        if api_key.is_empty() {
            return ApiOutcome::failure("An API key is required");
        }

        let request = TransportRequest {
            method,
            url: format!("{BASE_URL}{endpoint}"),
            bearer_token: api_key,
            body: body.map(|b| b.to_string()),
            timeout,
        };

        match self.transport.execute(request).await {
            Ok(response) if response.status >= 400 => {
                // Status and body detail stay here, in the log; callers get
                // a single credentials-class message.
                warn!(
                    status = response.status,
                    response_body = %response.body,
                    "Aleph Alpha API returned an error status"
                );
                ApiOutcome::failure("Bad credentials")
            }
            Ok(response) => match serde_json::from_str::<Value>(&response.body) {
                Ok(Value::Object(map)) => ApiOutcome::Success(map),
                _ => ApiOutcome::Success(Map::new()),
            },
            Err(err) => {
                warn!(
                    error = %err.message,
                    response_body = ?err.body,
                    "Aleph Alpha API error"
                );
                ApiOutcome::Failure(ApiFailure {
                    error: err.message,
                    body: err.body,
                })
            }
        }
    }
}
