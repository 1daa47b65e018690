//! Opaque token generation and PKCE (RFC 7636) challenge derivation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Generate an unguessable opaque token using two UUIDs (256 bits).
///
/// Used for OAuth `state`, code verifiers, and session identifiers. The
/// 64-character hex output is also a valid PKCE verifier (RFC 7636 requires
/// 43-128 unreserved characters).
#[must_use]
pub fn generate_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

/// Compute the S256 code challenge for a verifier.
///
/// `challenge = BASE64URL(SHA256(code_verifier))`
#[must_use]
pub fn code_challenge(code_verifier: &str) -> String {
    let hash = Sha256::digest(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}
