//! Configuration store with transparent API key encryption
//!
//! The store is a plain string key/value mapping persisted as JSON, the way
//! the host keeps app configuration. The `api_key` field is sealed on write
//! and opened on read; no other code path sees the plaintext at rest.
//! Stringly-typed lookups stop at this module: callers go through the typed
//! accessors.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use aleph_crypto::{is_encrypted, FieldCipher};

use crate::Result;

/// Model used when none is configured.
pub const DEFAULT_COMPLETION_MODEL: &str = "luminous-base";
/// Per-request timeout used when none is configured (seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 240;

const API_KEY: &str = "api_key";
const COMPLETION_MODEL: &str = "completion_model";
const REQUEST_TIMEOUT: &str = "request_timeout";

pub struct ConfigStore {
    values: HashMap<String, String>,
    path: Option<PathBuf>,
    cipher: FieldCipher,
}

impl ConfigStore {
    /// In-memory store, nothing persisted. Used by hosts that manage
    /// persistence themselves and by tests.
    pub fn new(cipher: FieldCipher) -> Self {
        Self {
            values: HashMap::new(),
            path: None,
            cipher,
        }
    }

    /// Open a store backed by a JSON file, loading it if present.
    pub fn open(path: PathBuf, cipher: FieldCipher) -> Result<Self> {
        let values = if path.exists() {
            serde_json::from_slice(&fs::read(&path)?)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            values,
            path: Some(path),
            cipher,
        })
    }

    /// Admin operation: store key/value pairs. Any key named `api_key` is
    /// sealed before persistence; everything else is stored verbatim.
    pub fn set_admin_config<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in values {
            let stored = if key == API_KEY {
                self.cipher.encrypt_field(&value)?
            } else {
                value
            };
            self.values.insert(key, stored);
        }
        self.save()
    }

    /// The decrypted API key, or an empty string when none is stored.
    pub fn api_key(&self) -> Result<String> {
        match self.values.get(API_KEY) {
            None => Ok(String::new()),
            Some(v) if v.is_empty() => Ok(String::new()),
            Some(v) => Ok(self.cipher.decrypt_field(v)?),
        }
    }

    /// The configured completion model, falling back to the default when
    /// unset or empty.
    pub fn completion_model(&self) -> String {
        match self.values.get(COMPLETION_MODEL) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => DEFAULT_COMPLETION_MODEL.to_string(),
        }
    }

    /// The per-request timeout. Unset, unparsable, or non-positive values
    /// fall back to the default.
    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .values
            .get(REQUEST_TIMEOUT)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|secs| *secs > 0)
            .map(|secs| secs as u64)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// One-shot upgrade step: seal a plaintext `api_key` left behind by an
    /// earlier version. Idempotent; returns whether anything was migrated.
    pub fn migrate_plaintext_api_key(&mut self) -> Result<bool> {
        let plaintext = match self.values.get(API_KEY) {
            Some(v) if !v.is_empty() && !is_encrypted(v) => v.clone(),
            _ => return Ok(false),
        };
        let sealed = self.cipher.encrypt_field(&plaintext)?;
        self.values.insert(API_KEY.to_string(), sealed);
        self.save()?;
        Ok(true)
    }

    /// The stored (possibly sealed) representation of a key.
    pub fn raw_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_vec_pretty(&self.values)?)?;
        }
        Ok(())
    }
}
