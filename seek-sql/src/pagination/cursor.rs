//! Cursor encoding/decoding for keyset pagination.
//!
//! A cursor token names one row of an ordered listing by its
//! `(row id, order key)` pair. The wire form is the standard base64 encoding
//! of `"<uuid>;<order key>"`.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::encoding::{FrameError, decode_payload, encode_payload};
use crate::value::{Value, format_timestamp};

/// Maximum accepted token length in bytes.
///
/// Real tokens are under 100 bytes; anything much larger is rejected before
/// base64 decoding.
pub const MAX_TOKEN_LEN: usize = 512;

/// The kind of order key an entity is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OrderKeyKind {
    /// Monotonically assigned integer (e.g. `BIGSERIAL`).
    Serial,
    /// UTC timestamp.
    Timestamp,
}

impl fmt::Display for OrderKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => f.write_str("serial"),
            Self::Timestamp => f.write_str("timestamp"),
        }
    }
}

/// A value that can order rows and round-trip through a cursor token.
///
/// Implemented for `i64` serials and `DateTime<Utc>` timestamps.
pub trait OrderKey: Clone + PartialEq + fmt::Debug + Sized {
    /// Which kind of order column this key type reads.
    const KIND: OrderKeyKind;

    /// Canonical textual form placed in the token.
    fn encode_key(&self) -> String;

    /// Parse the textual form back. Returns `None` on anything non-canonical.
    fn decode_key(text: &str) -> Option<Self>;

    /// The key as a bind parameter.
    fn to_value(&self) -> Value;
}

impl OrderKey for i64 {
    const KIND: OrderKeyKind = OrderKeyKind::Serial;

    fn encode_key(&self) -> String {
        self.to_string()
    }

    fn decode_key(text: &str) -> Option<Self> {
        let key: Self = text.parse().ok()?;
        // Rejects "+7", "007" and "-0" so every key has exactly one spelling.
        (key.to_string() == text).then_some(key)
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl OrderKey for DateTime<Utc> {
    const KIND: OrderKeyKind = OrderKeyKind::Timestamp;

    fn encode_key(&self) -> String {
        format_timestamp(self)
    }

    fn decode_key(text: &str) -> Option<Self> {
        // Years outside 0000..=9999 are written with a sign, which strict
        // RFC 3339 parsing refuses.
        text.parse::<Self>().ok()
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

/// A decoded cursor position: the seek boundary of the next query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor<K> {
    /// Unique row identifier, the tie-breaker.
    pub row_id: Uuid,
    /// Primary ordering key.
    pub order_key: K,
}

impl<K: OrderKey> Anchor<K> {
    /// Create an anchor from its parts.
    pub const fn new(row_id: Uuid, order_key: K) -> Self {
        Self { row_id, order_key }
    }

    /// Encode this anchor as an opaque token.
    #[must_use]
    pub fn encode(&self) -> String {
        encode_cursor(self.row_id, &self.order_key)
    }

    /// Decode a token into an anchor.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        decode_cursor(token)
    }
}

/// Encode a `(row id, order key)` pair as an opaque cursor token.
///
/// Cursors are base64, **not encryption**. Clients can read them; they only
/// ever hold the row id and the order key.
#[must_use]
pub fn encode_cursor<K: OrderKey>(row_id: Uuid, order_key: &K) -> String {
    encode_payload(&row_id.hyphenated().to_string(), &order_key.encode_key())
}

/// Decode a cursor token back into its anchor.
///
/// Never panics: every malformed input maps to a [`CursorError`].
pub fn decode_cursor<K: OrderKey>(token: &str) -> Result<Anchor<K>, CursorError> {
    if token.is_empty() {
        return Err(CursorError::Empty);
    }
    // Check size before decoding to prevent DoS attacks
    if token.len() > MAX_TOKEN_LEN {
        return Err(CursorError::TooLarge);
    }

    let (row_id, order_key) = decode_payload(token).map_err(|e| match e {
        FrameError::Base64 => CursorError::InvalidBase64,
        FrameError::Utf8 => CursorError::InvalidUtf8,
        FrameError::Parts => CursorError::InvalidFormat,
    })?;

    let row_id = parse_row_id(&row_id).ok_or(CursorError::InvalidRowId)?;
    let order_key = K::decode_key(&order_key).ok_or(CursorError::InvalidOrderKey(K::KIND))?;

    Ok(Anchor { row_id, order_key })
}

/// Only the lowercase hyphenated form is accepted.
fn parse_row_id(text: &str) -> Option<Uuid> {
    let id = Uuid::try_parse(text).ok()?;
    (id.hyphenated().to_string() == text).then_some(id)
}

/// Errors that can occur when decoding a cursor (the `InvalidCursor` kind).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CursorError {
    /// The token is an empty string.
    #[error("cursor is empty")]
    Empty,
    /// The token exceeds the maximum allowed size.
    #[error("cursor exceeds maximum size ({} bytes)", MAX_TOKEN_LEN)]
    TooLarge,
    /// The base64 encoding is invalid.
    #[error("invalid base64 encoding in cursor")]
    InvalidBase64,
    /// The decoded payload is not UTF-8.
    #[error("cursor payload is not valid UTF-8")]
    InvalidUtf8,
    /// The payload does not split into exactly two parts.
    #[error("invalid cursor format (expected `<id>;<key>`)")]
    InvalidFormat,
    /// The row id part is not a UUID.
    #[error("cursor row id is not a valid UUID")]
    InvalidRowId,
    /// The order key part does not parse as the expected kind.
    #[error("cursor order key is not a valid {0}")]
    InvalidOrderKey(OrderKeyKind),
}

impl CursorError {
    /// Returns `true` if this is an encoding/format error.
    #[inline]
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        !self.is_limit_error()
    }

    /// Returns `true` if this is a size error.
    #[inline]
    #[must_use]
    pub const fn is_limit_error(&self) -> bool {
        matches!(self, Self::TooLarge)
    }
}
