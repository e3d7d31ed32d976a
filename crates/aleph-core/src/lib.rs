//! Aleph Core - gateway to the Aleph Alpha completion API
//!
//! The gateway issues authenticated HTTP calls against the remote API,
//! normalizes every failure into a result mapping, and exposes the
//! completion capability to the host's text-processing pipeline through a
//! provider trait. Configuration (including the encrypted API key) is owned
//! by the host; this crate only reads it.

pub mod config;
pub mod http;
pub mod provider;
pub mod service;

pub use config::ConfigStore;
pub use http::{HttpTransport, ReqwestTransport};
pub use provider::{FreePromptProvider, ProviderError, TaskType, TextProcessingProvider};
pub use service::{AlephAlphaService, ApiFailure, ApiOutcome};

/// Core errors
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] aleph_crypto::CryptoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
