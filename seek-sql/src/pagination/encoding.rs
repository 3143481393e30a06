//! Token framing: `<row id>;<order key>` wrapped in standard base64.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Separator between the row id and the order key inside a token payload.
///
/// Neither a hyphenated UUID, a decimal serial nor an RFC 3339 timestamp can
/// contain it.
pub(super) const SEPARATOR: char = ';';

/// Join the two payload parts and encode them as an opaque token.
pub(super) fn encode_payload(row_id: &str, order_key: &str) -> String {
    STANDARD.encode(format!("{row_id}{SEPARATOR}{order_key}"))
}

/// Reasons a token cannot be unframed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FrameError {
    Base64,
    Utf8,
    Parts,
}

/// Decode a token and split it into exactly two parts.
pub(super) fn decode_payload(token: &str) -> Result<(String, String), FrameError> {
    let bytes = STANDARD.decode(token).map_err(|_| FrameError::Base64)?;
    let payload = String::from_utf8(bytes).map_err(|_| FrameError::Utf8)?;

    let mut parts = payload.split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(row_id), Some(order_key), None) => Ok((row_id.to_string(), order_key.to_string())),
        _ => Err(FrameError::Parts),
    }
}
