//! Host-facing text-processing provider
//!
//! The gateway speaks in result mappings; the host's task pipeline wants a
//! string or a failure. This adapter is the single point where an error
//! mapping becomes a typed error, because its contract cannot express
//! partial success.

use async_trait::async_trait;
use serde_json::Value;

use crate::service::{AlephAlphaService, ApiOutcome};

/// Completions requested per task.
const COMPLETION_COUNT: u32 = 1;
/// Token budget per task.
const COMPLETION_MAX_TOKENS: u32 = 100;

/// Task categories the host can dispatch to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    FreePrompt,
}

impl TaskType {
    /// Stable identifier used by the host's task registry.
    pub fn id(self) -> &'static str {
        match self {
            Self::FreePrompt => "text2text:free_prompt",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The API answered, but not with the expected completion shape.
    #[error("No result in Aleph Alpha response. {detail}")]
    NoCompletion { detail: String },
}

/// A completion capability as the host's task-processing subsystem sees it.
#[async_trait]
pub trait TextProcessingProvider: Send + Sync {
    fn name(&self) -> String;
    fn task_type(&self) -> TaskType;
    async fn process(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

/// Free-prompt completion backed by the Aleph Alpha gateway.
pub struct FreePromptProvider {
    service: AlephAlphaService,
}

impl FreePromptProvider {
    pub fn new(service: AlephAlphaService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl TextProcessingProvider for FreePromptProvider {
    fn name(&self) -> String {
        "Aleph Alpha integration".to_string()
    }

    fn task_type(&self) -> TaskType {
        TaskType::FreePrompt
    }

    async fn process(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        let outcome = self
            .service
            .create_completion(prompt, COMPLETION_COUNT, COMPLETION_MAX_TOKENS)
            .await;

        if let ApiOutcome::Success(map) = &outcome {
            if let Some(Value::Array(completions)) = map.get("completions") {
                if let Some(Value::String(text)) =
                    completions.first().and_then(|first| first.get("completion"))
                {
                    return Ok(text.clone());
                }
            }
        }

        let detail = match &outcome {
            ApiOutcome::Success(map) => map
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            ApiOutcome::Failure(failure) => failure.error.clone(),
        };
        Err(ProviderError::NoCompletion { detail })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, RwLock};

    use super::*;
    use crate::config::ConfigStore;
    use crate::service::testing::MockTransport;
    use aleph_crypto::FieldCipher;

    fn provider_with(transport: MockTransport) -> (FreePromptProvider, Arc<MockTransport>) {
        let mut store = ConfigStore::new(FieldCipher::generate());
        store
            .set_admin_config(vec![("api_key".to_string(), "sk-test".to_string())])
            .unwrap();
        let transport = Arc::new(transport);
        let service = AlephAlphaService::with_transport(
            Arc::new(RwLock::new(store)),
            transport.clone(),
        );
        (FreePromptProvider::new(service), transport)
    }

    #[tokio::test]
    async fn returns_first_completion() {
        let (provider, _) = provider_with(MockTransport::replying(
            200,
            r#"{"completions":[{"completion":"ok"},{"completion":"second"}]}"#,
        ));

        assert_eq!(provider.process("Hello").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn empty_mapping_fails_with_no_result() {
        let (provider, _) = provider_with(MockTransport::replying(200, "{}"));

        let err = provider.process("Hello").await.unwrap_err();
        assert!(err.to_string().contains("No result"));
    }

    #[tokio::test]
    async fn empty_completions_array_fails() {
        let (provider, _) = provider_with(MockTransport::replying(200, r#"{"completions":[]}"#));

        assert!(provider.process("Hello").await.is_err());
    }

    #[tokio::test]
    async fn malformed_first_completion_fails() {
        let (provider, _) =
            provider_with(MockTransport::replying(200, r#"{"completions":[{"text":"x"}]}"#));

        assert!(provider.process("Hello").await.is_err());
    }

    #[tokio::test]
    async fn gateway_failure_detail_is_included() {
        let (provider, _) = provider_with(MockTransport::replying(401, "{}"));

        let err = provider.process("Hello").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("No result"));
        assert!(message.contains("Bad credentials"));
    }

    #[tokio::test]
    async fn requests_one_completion_with_fixed_budget() {
        let (provider, transport) = provider_with(MockTransport::replying(
            200,
            r#"{"completions":[{"completion":"ok"}]}"#,
        ));

        provider.process("Hello").await.unwrap();

        let body: serde_json::Value =
            serde_json::from_str(&transport.last_request().unwrap().body.unwrap()).unwrap();
        assert_eq!(body["n"], 1);
        assert_eq!(body["maximum_tokens"], 100);
    }

    #[test]
    fn identity() {
        let (provider, _) = provider_with(MockTransport::replying(200, "{}"));
        assert_eq!(provider.name(), "Aleph Alpha integration");
        assert_eq!(provider.task_type(), TaskType::FreePrompt);
        assert_eq!(provider.task_type().id(), "text2text:free_prompt");
    }
}
