//! Opaque feed cursor codec.
//!
//! A cursor encodes a fixed point in the incident total order
//! `(created_at DESC, id DESC)` plus a fingerprint of the filters it was
//! issued under. Pagination resumes strictly after that point, so rows
//! inserted after the cursor was issued sort before it and can neither
//! reappear on the next page nor push another row out of it. The token is
//! URL-safe base64 of a JSON payload; clients must treat it as opaque.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Upper bound on accepted token length; anything longer is garbage.
const MAX_CURSOR_TOKEN_LEN: usize = 512;

/// Why a cursor was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorErrorCode {
    /// Not valid base64 or too long.
    InvalidFormat,
    /// Decoded bytes were not the expected JSON payload.
    InvalidPayload,
    /// The cursor was issued under different feed filters.
    FilterMismatch,
}

/// Error returned when a cursor cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorError {
    /// Machine-readable rejection reason.
    pub code: CursorErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl CursorError {
    fn new(code: CursorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for CursorError {}

/// The decoded contents of a feed cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPayload {
    /// `created_at` of the last row the client has seen, in microseconds.
    pub created_at_micros: i64,
    /// `id` of the last row the client has seen.
    pub id: i64,
    /// Fingerprint of the filters the cursor was issued under.
    pub filter: String,
}

/// Encodes a cursor payload into an opaque token.
#[must_use]
pub fn encode_cursor(payload: &CursorPayload) -> String {
    // Serializing a struct of two ints and a string cannot fail.
    let bytes = serde_json::to_vec(payload).expect("cursor payload serializes");
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes and validates a cursor token.
///
/// # Errors
///
/// Returns [`CursorError`] if the token is malformed or was issued under
/// a different filter fingerprint than `expected_filter`.
pub fn decode_cursor(token: &str, expected_filter: &str) -> Result<CursorPayload, CursorError> {
    if token.len() > MAX_CURSOR_TOKEN_LEN {
        return Err(CursorError::new(
            CursorErrorCode::InvalidFormat,
            "cursor exceeds max length",
        ));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| CursorError::new(CursorErrorCode::InvalidFormat, e.to_string()))?;

    let payload: CursorPayload = serde_json::from_slice(&bytes)
        .map_err(|e| CursorError::new(CursorErrorCode::InvalidPayload, e.to_string()))?;

    if payload.filter != expected_filter {
        return Err(CursorError::new(
            CursorErrorCode::FilterMismatch,
            "cursor was issued for a different filter",
        ));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let payload = CursorPayload {
            created_at_micros: 1_761_000_000_000_000,
            id: 42,
            filter: "crime/*".to_string(),
        };
        let token = encode_cursor(&payload);
        assert_eq!(decode_cursor(&token, "crime/*").unwrap(), payload);
    }

    #[test]
    fn token_is_opaque_url_safe() {
        let token = encode_cursor(&CursorPayload {
            created_at_micros: 1,
            id: 1,
            filter: "*/*".to_string(),
        });
        assert!(!token.contains('{'));
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            decode_cursor("not!!base64", "*/*").unwrap_err().code,
            CursorErrorCode::InvalidFormat
        );
        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert_eq!(
            decode_cursor(&not_json, "*/*").unwrap_err().code,
            CursorErrorCode::InvalidPayload
        );
    }

    #[test]
    fn rejects_filter_mismatch() {
        let token = encode_cursor(&CursorPayload {
            created_at_micros: 5,
            id: 5,
            filter: "crime/high".to_string(),
        });
        assert_eq!(
            decode_cursor(&token, "*/*").unwrap_err().code,
            CursorErrorCode::FilterMismatch
        );
    }

    #[test]
    fn rejects_oversized_tokens() {
        let long = "A".repeat(MAX_CURSOR_TOKEN_LEN + 1);
        assert_eq!(
            decode_cursor(&long, "*/*").unwrap_err().code,
            CursorErrorCode::InvalidFormat
        );
    }
}
