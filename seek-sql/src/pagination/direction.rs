//! Pagination direction resolution from `next_token` / `prev_token`.

use super::cursor::{Anchor, CursorError, OrderKey, decode_cursor};

/// Which way a request pages relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// No anchor: the first page.
    #[default]
    Initial,
    /// `next_token` governs: continue toward older / smaller keys.
    Forward,
    /// `prev_token` governs: continue toward newer / larger keys.
    Backward,
}

/// A resolved seek position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seek<K> {
    /// First page, no anchor.
    Initial,
    /// Rows strictly after the anchor in display order.
    After(Anchor<K>),
    /// Rows strictly before the anchor in display order.
    Before(Anchor<K>),
}

impl<K> Seek<K> {
    /// The direction this seek pages in.
    pub const fn direction(&self) -> Direction {
        match self {
            Self::Initial => Direction::Initial,
            Self::After(_) => Direction::Forward,
            Self::Before(_) => Direction::Backward,
        }
    }

    /// The anchor, if any.
    pub const fn anchor(&self) -> Option<&Anchor<K>> {
        match self {
            Self::Initial => None,
            Self::After(anchor) | Self::Before(anchor) => Some(anchor),
        }
    }
}

/// Which request field a token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenField {
    /// `next_token`
    Next,
    /// `prev_token`
    Prev,
}

impl TokenField {
    /// Request parameter name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Next => "next_token",
            Self::Prev => "prev_token",
        }
    }
}

/// A token that failed to decode, with the field it came from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {}: {source}", field.as_str())]
pub struct TokenError {
    /// Offending field.
    pub field: TokenField,
    /// Why it failed.
    #[source]
    pub source: CursorError,
}

/// Decide which token governs and decode it.
///
/// - neither token → [`Seek::Initial`]
/// - both tokens → `prev` is discarded with a warning and `next` governs
/// - one token → it is decoded; failure names the field at fault
///
/// Empty strings count as absent.
pub fn resolve<K: OrderKey>(
    next: Option<&str>,
    prev: Option<&str>,
) -> Result<Seek<K>, TokenError> {
    let next = next.filter(|t| !t.is_empty());
    let prev = prev.filter(|t| !t.is_empty());

    match (next, prev) {
        (None, None) => Ok(Seek::Initial),
        (Some(next), prev) => {
            if let Some(prev) = prev {
                tracing::warn!(
                    next_len = next.len(),
                    prev_len = prev.len(),
                    "both next_token and prev_token supplied, using next_token"
                );
            }
            decode(TokenField::Next, next).map(Seek::After)
        }
        (None, Some(prev)) => decode(TokenField::Prev, prev).map(Seek::Before),
    }
}

fn decode<K: OrderKey>(field: TokenField, token: &str) -> Result<Anchor<K>, TokenError> {
    decode_cursor(token).map_err(|source| {
        tracing::debug!(field = field.as_str(), error = %source, "rejected cursor token");
        TokenError { field, source }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::cursor::encode_cursor;
    use std::fmt::{self, Write as _};
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use uuid::Uuid;

    fn token(n: u128, key: i64) -> String {
        encode_cursor(Uuid::from_u128(n), &key)
    }

    /// Events recorded as `(level, "field=value ...")`.
    #[derive(Clone, Default)]
    struct EventStore(Arc<Mutex<Vec<(Level, String)>>>);

    struct EventCaptureLayer(EventStore);

    struct FieldVisitor(String);

    impl Visit for FieldVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            let _ = write!(self.0, "{}={:?} ", field.name(), value);
        }
    }

    impl<S: Subscriber> Layer<S> for EventCaptureLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = FieldVisitor(String::new());
            event.record(&mut fields);
            let level = *event.metadata().level();
            self.0.0.lock().unwrap().push((level, fields.0));
        }
    }

    fn capture_events(f: impl FnOnce()) -> Vec<(Level, String)> {
        let store = EventStore::default();
        let subscriber = tracing_subscriber::registry().with(EventCaptureLayer(store.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let events = store.0.lock().unwrap().clone();
        events
    }

    fn warnings(events: &[(Level, String)]) -> Vec<&str> {
        events
            .iter()
            .filter(|(level, _)| *level == Level::WARN)
            .map(|(_, fields)| fields.as_str())
            .collect()
    }

    #[test]
    fn test_no_tokens() {
        assert_eq!(resolve::<i64>(None, None), Ok(Seek::Initial));
        assert_eq!(resolve::<i64>(Some(""), Some("")), Ok(Seek::Initial));
        assert_eq!(Seek::<i64>::Initial.direction(), Direction::Initial);
        assert!(Seek::<i64>::Initial.anchor().is_none());
    }

    #[test]
    fn test_next_token() {
        let seek = resolve::<i64>(Some(&token(20, 20)), None).unwrap();
        assert_eq!(seek.direction(), Direction::Forward);
        assert_eq!(seek.anchor(), Some(&Anchor::new(Uuid::from_u128(20), 20)));
    }

    #[test]
    fn test_prev_token() {
        let seek = resolve::<i64>(None, Some(&token(10, 10))).unwrap();
        assert_eq!(seek.direction(), Direction::Backward);
        assert_eq!(seek.anchor(), Some(&Anchor::new(Uuid::from_u128(10), 10)));
    }

    #[test]
    fn test_both_tokens_next_wins() {
        let both = resolve::<i64>(Some(&token(20, 20)), Some(&token(10, 10))).unwrap();
        let only_next = resolve::<i64>(Some(&token(20, 20)), None).unwrap();
        assert_eq!(both, only_next);
    }

    #[test]
    fn test_both_tokens_logs_warning() {
        let (next, prev) = (token(20, 20), token(10, 10));
        let events = capture_events(|| {
            resolve::<i64>(Some(&next), Some(&prev)).unwrap();
        });
        let warned = warnings(&events);
        assert_eq!(warned.len(), 1, "{events:?}");
        assert!(warned[0].contains("both next_token and prev_token supplied"));
        assert!(warned[0].contains(&format!("next_len={}", next.len())));
        assert!(warned[0].contains(&format!("prev_len={}", prev.len())));
    }

    #[test]
    fn test_single_token_does_not_warn() {
        let events = capture_events(|| {
            resolve::<i64>(Some(&token(20, 20)), None).unwrap();
            resolve::<i64>(None, Some(&token(10, 10))).unwrap();
            resolve::<i64>(Some(&token(20, 20)), Some("")).unwrap();
        });
        assert!(warnings(&events).is_empty(), "{events:?}");
    }

    #[test]
    fn test_both_tokens_invalid_prev_is_ignored() {
        let seek = resolve::<i64>(Some(&token(20, 20)), Some("garbage!")).unwrap();
        assert_eq!(seek.direction(), Direction::Forward);
    }

    #[test]
    fn test_empty_next_falls_back_to_prev() {
        let seek = resolve::<i64>(Some(""), Some(&token(10, 10))).unwrap();
        assert_eq!(seek.direction(), Direction::Backward);
    }

    #[test]
    fn test_invalid_next_token() {
        let err = resolve::<i64>(Some("garbage!"), None).unwrap_err();
        assert_eq!(err.field, TokenField::Next);
        assert_eq!(err.source, CursorError::InvalidBase64);
        assert_eq!(
            err.to_string(),
            "invalid next_token: invalid base64 encoding in cursor"
        );
    }

    #[test]
    fn test_invalid_prev_token() {
        let err = resolve::<i64>(None, Some("garbage!")).unwrap_err();
        assert_eq!(err.field, TokenField::Prev);
    }
}
