//! API Key generation
//!
//! Mints credentials of the form `<prefix><43 url-safe base64 chars>` from
//! 32 bytes of OS randomness.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::infrastructure::crypto::SecretHasher;

pub const DEFAULT_KEY_PREFIX: &str = "dk_live_";

const KEY_BYTES: usize = 32;
const DISPLAY_CHARS: usize = 8;

/// Result of generating a new API key
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The full credential (only shown once at creation)
    pub key: String,
    /// Literal prefix + first 8 random characters
    pub display_prefix: String,
    /// Fingerprint for storage
    pub hash: String,
}

/// Generator for secure API keys
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    prefix: String,
    hasher: SecretHasher,
}

impl ApiKeyGenerator {
    pub fn new(prefix: impl Into<String>, hasher: SecretHasher) -> Self {
        Self {
            prefix: prefix.into(),
            hasher,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a new API key
    pub fn generate(&self) -> GeneratedApiKey {
        let mut random_bytes = [0u8; KEY_BYTES];
        OsRng.fill_bytes(&mut random_bytes);

        self.from_secret(&URL_SAFE_NO_PAD.encode(random_bytes))
    }

    /// Build a key around an encoded random part
    fn from_secret(&self, secret: &str) -> GeneratedApiKey {
        let key = format!("{}{}", self.prefix, secret);
        let display: String = secret.chars().take(DISPLAY_CHARS).collect();

        GeneratedApiKey {
            hash: self.hasher.fingerprint(&key),
            display_prefix: format!("{}{}", self.prefix, display),
            key,
        }
    }

    /// Cheap syntactic check done before any storage access
    pub fn is_well_formed(&self, raw: &str) -> bool {
        match raw.strip_prefix(self.prefix.as_str()) {
            Some(rest) => {
                !rest.is_empty()
                    && rest
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            }
            None => false,
        }
    }

    /// Fingerprint of a presented credential
    pub fn hash_key(&self, raw: &str) -> String {
        self.hasher.fingerprint(raw)
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX, SecretHasher::new())
    }
}
