//! Secret hasher
//!
//! Deterministic, one-way transform of raw secret material into the
//! fingerprint that is stored and looked up. Without a pepper the output is
//! `sha256$<b64>`; with a server-side pepper it is `hmac-sha256$<b64>`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Default)]
pub struct SecretHasher {
    pepper: Option<Vec<u8>>,
}

impl SecretHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mix a server-side secret into every fingerprint. Changing it
    /// invalidates every stored fingerprint.
    pub fn with_pepper(mut self, pepper: impl AsRef<[u8]>) -> Self {
        let pepper = pepper.as_ref();
        self.pepper = (!pepper.is_empty()).then(|| pepper.to_vec());
        self
    }

    pub fn fingerprint(&self, raw: &str) -> String {
        match &self.pepper {
            Some(pepper) => match HmacSha256::new_from_slice(pepper) {
                Ok(mut mac) => {
                    mac.update(raw.as_bytes());
                    format!(
                        "hmac-sha256${}",
                        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
                    )
                }
                // HMAC accepts keys of any length
                Err(_) => Self::plain(raw),
            },
            None => Self::plain(raw),
        }
    }

    fn plain(raw: &str) -> String {
        let digest = Sha256::digest(raw.as_bytes());
        format!("sha256${}", URL_SAFE_NO_PAD.encode(digest))
    }
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher")
            .field("peppered", &self.pepper.is_some())
            .finish()
    }
}

/// Constant-time byte comparison
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
