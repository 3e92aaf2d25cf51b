//! Stateless client session tokens.
//!
//! A token is `base64url(nonce ‖ tag ‖ ciphertext)` where the ciphertext is
//! the AES-256-GCM encryption of a small JSON payload holding the subject id
//! and an expiry in epoch milliseconds. The key is derived from a
//! server-held secret and never travels with the token, so any process that
//! shares the secret can decode tokens without a session store. Rotating the
//! secret invalidates every outstanding token.
//!
//! Decoding never fails loudly: malformed input, a bad tag, or an expired
//! payload all yield `None`.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::hashing::derive_key;
use crate::types::DbId;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Domain separator mixed into the key derivation.
const KEY_CONTEXT: &[u8] = b"quoteflow.client-session.v1:";

#[derive(Debug, Serialize, Deserialize)]
struct SessionPayload {
    sub: DbId,
    exp: i64,
}

/// Error returned when a codec cannot be built from the configured secret.
#[derive(Debug, thiserror::Error)]
#[error("session secret must not be empty")]
pub struct EmptySecretError;

/// Symmetric, authenticated encoder/decoder for client session tokens.
#[derive(Clone)]
pub struct SessionCodec {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec").finish_non_exhaustive()
    }
}

impl SessionCodec {
    /// Build a codec from a secret of any length.
    ///
    /// The 256-bit key is `SHA-256(context ‖ secret)`. An empty secret is
    /// rejected rather than silently producing a predictable key.
    pub fn new(secret: &str) -> Result<Self, EmptySecretError> {
        if secret.is_empty() {
            return Err(EmptySecretError);
        }
        let key_bytes = derive_key(KEY_CONTEXT, secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Mint a token for `subject_id` valid for `ttl` from now.
    pub fn encode(&self, subject_id: DbId, ttl: chrono::Duration) -> String {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.encode_at(subject_id, now_ms.saturating_add(ttl.num_milliseconds()))
    }

    /// Mint a token for `subject_id` that expires at `expires_at_ms`.
    pub fn encode_at(&self, subject_id: DbId, expires_at_ms: i64) -> String {
        let payload = SessionPayload {
            sub: subject_id,
            exp: expires_at_ms,
        };
        // Serializing two integers cannot fail.
        let mut buffer = serde_json::to_vec(&payload).unwrap_or_default();

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let tag = match self.cipher.encrypt_in_place_detached(nonce, b"", &mut buffer) {
            Ok(tag) => tag,
            Err(_) => {
                // Only reachable for payloads beyond the AES-GCM size limit.
                tracing::error!("Session payload encryption failed");
                return String::new();
            }
        };

        let mut token = Vec::with_capacity(NONCE_LEN + TAG_LEN + buffer.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&tag);
        token.extend_from_slice(&buffer);
        URL_SAFE_NO_PAD.encode(token)
    }

    /// Decode a token, returning its subject id if it is authentic and unexpired.
    pub fn decode(&self, token: &str) -> Option<DbId> {
        self.decode_at(token, chrono::Utc::now().timestamp_millis())
    }

    /// Decode a token against an explicit clock reading (epoch milliseconds).
    pub fn decode_at(&self, token: &str, now_ms: i64) -> Option<DbId> {
        let raw = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
        if raw.len() <= NONCE_LEN + TAG_LEN {
            return None;
        }

        let (nonce_bytes, rest) = raw.split_at(NONCE_LEN);
        let (tag_bytes, ciphertext) = rest.split_at(TAG_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let tag = Tag::from_slice(tag_bytes);

        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(nonce, b"", &mut buffer, tag)
            .ok()?;

        let payload: SessionPayload = serde_json::from_slice(&buffer).ok()?;
        if now_ms > payload.exp {
            return None;
        }
        Some(payload.sub)
    }
}
