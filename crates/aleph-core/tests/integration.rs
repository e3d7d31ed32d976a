//! End-to-end flow: admin config -> persisted store -> gateway -> provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use aleph_core::http::{HttpTransport, TransportError, TransportRequest, TransportResponse};
use aleph_core::{
    AlephAlphaService, ConfigStore, FreePromptProvider, TextProcessingProvider,
};
use aleph_crypto::{keyfile, is_encrypted};

struct RecordingTransport {
    status: u16,
    body: String,
    calls: AtomicUsize,
    seen: Mutex<Vec<TransportRequest>>,
}

impl RecordingTransport {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request);
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

#[tokio::test]
async fn admin_config_through_gateway_to_provider() {
    let dir = tempfile::tempdir().unwrap();
    let cipher = keyfile::load_or_generate(&dir.path().join("field.key")).unwrap();
    let config_path = dir.path().join("config.json");

    // Admin sets the key and a control model; the key must land sealed.
    let mut store = ConfigStore::open(config_path.clone(), cipher).unwrap();
    store
        .set_admin_config(vec![
            ("api_key".to_string(), "sk-integration".to_string()),
            ("completion_model".to_string(), "luminous-control".to_string()),
        ])
        .unwrap();
    assert!(is_encrypted(store.raw_value("api_key").unwrap()));

    // A fresh process re-opens both files and serves a completion.
    let cipher = keyfile::load_or_generate(&dir.path().join("field.key")).unwrap();
    let store = ConfigStore::open(config_path, cipher).unwrap();
    let transport = Arc::new(RecordingTransport::new(
        200,
        r#"{"completions":[{"completion":"All good."}]}"#,
    ));
    let service =
        AlephAlphaService::with_transport(Arc::new(RwLock::new(store)), transport.clone());
    let provider = FreePromptProvider::new(service);

    let answer = provider.process("How are you?").await.unwrap();
    assert_eq!(answer, "All good.");

    // Exactly one call, with the decrypted key and the instruction template.
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    let request = transport.seen.lock().unwrap().pop().unwrap();
    assert_eq!(request.bearer_token, "sk-integration");
    let body: serde_json::Value = serde_json::from_str(&request.body.unwrap()).unwrap();
    assert_eq!(
        body["prompt"],
        " ### Instruction:\nHow are you?\n### Response:"
    );
}

#[tokio::test]
async fn missing_key_never_touches_the_network() {
    let transport = Arc::new(RecordingTransport::new(200, "{}"));
    let store = ConfigStore::new(aleph_crypto::FieldCipher::generate());
    let service =
        AlephAlphaService::with_transport(Arc::new(RwLock::new(store)), transport.clone());

    let outcome = service.get_models().await;

    assert_eq!(outcome.error(), Some("An API key is required"));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}
