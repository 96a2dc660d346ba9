//! HMAC request signing for proxy-mode calls
//!
//! The canonical message is `"{timestamp}|{method}|{endpoint}"`. It is MACed
//! with HMAC-SHA256 under the base64-decoded signing key and the tag is
//! returned as standard base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Signing failures; all of them are configuration problems
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signing key is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("signing key decodes to zero bytes")]
    EmptyKey,

    #[error("HMAC-SHA256 rejected the signing key")]
    InvalidKey,
}

/// Decoded signing key
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Decode a base64 key
    pub fn from_base64(encoded: &str) -> Result<Self, SignatureError> {
        let bytes = STANDARD.decode(encoded.trim())?;
        if bytes.is_empty() {
            return Err(SignatureError::EmptyKey);
        }
        Ok(Self(bytes))
    }

    /// Sign a logical request
    pub fn sign(&self, timestamp: i64, method: &str, endpoint: &str) -> Result<String, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.0).map_err(|_| SignatureError::InvalidKey)?;
        mac.update(canonical_message(timestamp, method, endpoint).as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(***)")
    }
}

/// Build the pipe-delimited string that gets signed
pub fn canonical_message(timestamp: i64, method: &str, endpoint: &str) -> String {
    format!("{}|{}|{}", timestamp, method, endpoint)
}

/// Sign with a base64-encoded key in one step
pub fn sign(
    signing_key_base64: &str,
    timestamp: i64,
    method: &str,
    endpoint: &str,
) -> Result<String, SignatureError> {
    SigningKey::from_base64(signing_key_base64)?.sign(timestamp, method, endpoint)
}
