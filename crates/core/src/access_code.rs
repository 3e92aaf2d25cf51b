//! One-time client access codes.
//!
//! Codes are short, uppercase, and drawn from an alphabet without the
//! easily confused characters `0 O 1 I`. Only the SHA-256 digest of the
//! normalized code is ever stored; the plaintext is handed back to the
//! issuer exactly once.

use rand::Rng;

use crate::hashing::sha256_hex;
use crate::types::Timestamp;

/// Characters a generated code may contain.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a generated code.
pub const CODE_LENGTH: usize = 10;

/// Issuance attempts before a hash collision is surfaced as a conflict.
pub const MAX_ISSUE_ATTEMPTS: u32 = 5;

/// Days a freshly issued code stays valid when no expiry is configured.
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

/// A freshly generated code.
#[derive(Debug, Clone)]
pub struct GeneratedAccessCode {
    /// The plaintext code (shown to the issuer exactly once, never stored).
    pub plaintext: String,
    /// SHA-256 hex digest of the normalized code (stored in the database).
    pub hash: String,
}

/// Generate a new random access code.
pub fn generate_access_code() -> GeneratedAccessCode {
    let mut rng = rand::rng();
    let plaintext: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    let hash = hash_access_code(&plaintext);
    GeneratedAccessCode { plaintext, hash }
}

/// Strip everything but ASCII letters and digits and uppercase the rest.
///
/// Lets clients paste codes with spaces, dashes, or in lowercase.
pub fn normalize_access_code(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Hash a code for storage or lookup. The input is normalized first.
pub fn hash_access_code(code: &str) -> String {
    sha256_hex(normalize_access_code(code).as_bytes())
}

/// Format a code in two dash-separated halves for display (`ABCDE-FGHJK`).
pub fn format_for_display(code: &str) -> String {
    let normalized = normalize_access_code(code);
    if normalized.len() <= 5 {
        return normalized;
    }
    let (head, tail) = normalized.split_at(normalized.len() / 2);
    format!("{head}-{tail}")
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Why a presented code does not grant access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCodeFailure {
    /// No code with this hash exists.
    Invalid,
    /// The code exists but is past its expiry.
    Expired,
    /// The code exists but was revoked.
    Revoked,
}

impl AccessCodeFailure {
    /// Short, user-facing explanation.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Invalid => "Access code is not valid. Check the code and try again",
            Self::Expired => "Access code has expired. Ask for a new code",
            Self::Revoked => "Access code is no longer active. Ask for a new code",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

/// Lifecycle fields of a stored code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeState {
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

/// Decide whether a stored code (if any) grants access at `now`.
///
/// Revocation wins over expiry; a code expiring exactly at `now` is expired.
pub fn classify(state: Option<CodeState>, now: Timestamp) -> Result<(), AccessCodeFailure> {
    let state = state.ok_or(AccessCodeFailure::Invalid)?;
    if state.revoked_at.is_some() {
        return Err(AccessCodeFailure::Revoked);
    }
    match state.expires_at {
        Some(expires_at) if expires_at <= now => Err(AccessCodeFailure::Expired),
        _ => Ok(()),
    }
}

/// Validate that a submitted code is plausibly well-formed before lookup.
pub fn validate_code_input(input: &str) -> Result<String, String> {
    let normalized = normalize_access_code(input);
    if normalized.is_empty() {
        return Err("Access code is required".to_string());
    }
    if normalized.len() > CODE_LENGTH * 4 {
        return Err("Access code is too long".to_string());
    }
    Ok(normalized)
}
