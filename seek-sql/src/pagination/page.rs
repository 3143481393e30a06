//! Post-query page assembly: look-ahead trimming and token minting.

use serde::{Deserialize, Serialize};

use super::cursor::{Anchor, OrderKey};
use super::direction::Direction;

/// Rows trimmed to the requested limit, in display order, with look-ahead flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow<R> {
    /// At most `limit` rows, ordered `order key DESC, row id DESC`.
    pub rows: Vec<R>,
    /// Whether a next page exists.
    pub has_next: bool,
    /// Whether a previous page exists.
    pub has_prev: bool,
}

/// Trim a `limit + 1` fetch to a page and derive the look-ahead flags.
///
/// | Direction | `has_next` | `has_prev` |
/// |-----------|------------|------------|
/// | Initial | more | `false` |
/// | Forward | more | `true` |
/// | Backward | `true` | more |
///
/// where *more* is `rows.len() > limit`. Backward fetches come in ascending
/// order and are reversed after trimming. Zero rows always yield an empty
/// window with both flags cleared.
pub fn finalize_page<R>(mut rows: Vec<R>, limit: usize, direction: Direction) -> PageWindow<R> {
    let fetched = rows.len();
    if fetched == 0 {
        tracing::trace!(?direction, limit, "empty page");
        return PageWindow {
            rows,
            has_next: false,
            has_prev: false,
        };
    }

    let has_more = fetched > limit;
    rows.truncate(limit);

    let (has_next, has_prev) = match direction {
        Direction::Initial => (has_more, false),
        Direction::Forward => (has_more, true),
        Direction::Backward => {
            rows.reverse();
            (true, has_more)
        }
    };

    tracing::trace!(?direction, limit, fetched, has_next, has_prev, "finalized page");

    PageWindow {
        rows,
        has_next,
        has_prev,
    }
}

impl<R> PageWindow<R> {
    /// Mint tokens and build the response page.
    ///
    /// `prev_token` comes from the first row (only if `has_prev`), `next_token`
    /// from the last row (only if `has_next`).
    pub fn into_page<K, F>(self, limit: u32, anchor_of: F) -> Page<R>
    where
        K: OrderKey,
        F: Fn(&R) -> Anchor<K>,
    {
        let next = self
            .rows
            .last()
            .filter(|_| self.has_next)
            .map(|row| anchor_of(row).encode());
        let prev = self
            .rows
            .first()
            .filter(|_| self.has_prev)
            .map(|row| anchor_of(row).encode());

        let paginator = Paginator::new(self.rows.len(), limit)
            .with_next_token(next)
            .with_prev_token(prev);

        Page {
            items: self.rows,
            paginator,
        }
    }
}

/// Paging metadata returned alongside the items.
///
/// Absent tokens are omitted from the serialized form, never empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    /// Number of items on this page.
    pub size: usize,
    /// Requested limit.
    pub limit: u32,
    /// Token for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    /// Token for the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_token: Option<String>,
}

impl Paginator {
    /// Create a paginator without tokens.
    #[must_use]
    pub const fn new(size: usize, limit: u32) -> Self {
        Self {
            size,
            limit,
            next_token: None,
            prev_token: None,
        }
    }

    /// Set the next token.
    #[must_use]
    pub fn with_next_token(mut self, token: Option<String>) -> Self {
        self.next_token = token;
        self
    }

    /// Set the previous token.
    #[must_use]
    pub fn with_prev_token(mut self, token: Option<String>) -> Self {
        self.prev_token = token;
        self
    }

    /// Whether a next page exists.
    pub const fn has_next(&self) -> bool {
        self.next_token.is_some()
    }

    /// Whether a previous page exists.
    pub const fn has_prev(&self) -> bool {
        self.prev_token.is_some()
    }
}

/// One page of a listing: `{ items, paginator }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in display order.
    pub items: Vec<T>,
    /// Paging metadata.
    pub paginator: Paginator,
}

impl<T> Page<T> {
    /// Convert the items, keeping the paginator.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            paginator: self.paginator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn anchor(serial: &i64) -> Anchor<i64> {
        Anchor::new(Uuid::from_u128(u128::from(serial.unsigned_abs())), *serial)
    }

    #[test]
    fn test_initial_with_more() {
        let w = finalize_page(vec![30, 20, 10], 2, Direction::Initial);
        assert_eq!(w.rows, vec![30, 20]);
        assert!(w.has_next);
        assert!(!w.has_prev);
    }

    #[test]
    fn test_initial_exact_fit() {
        let w = finalize_page(vec![30, 20], 2, Direction::Initial);
        assert_eq!(w.rows, vec![30, 20]);
        assert!(!w.has_next);
        assert!(!w.has_prev);
    }

    #[test]
    fn test_forward_last_page() {
        let w = finalize_page(vec![10], 2, Direction::Forward);
        assert_eq!(w.rows, vec![10]);
        assert!(!w.has_next);
        assert!(w.has_prev);
    }

    #[test]
    fn test_backward_is_reversed() {
        // Fetched ascending: nearest predecessors first, plus one look-ahead.
        let w = finalize_page(vec![20, 30, 40], 2, Direction::Backward);
        assert_eq!(w.rows, vec![30, 20]);
        assert!(w.has_next);
        assert!(w.has_prev);

        let w = finalize_page(vec![20, 30], 2, Direction::Backward);
        assert_eq!(w.rows, vec![30, 20]);
        assert!(w.has_next);
        assert!(!w.has_prev);
    }

    #[test]
    fn test_zero_rows_has_no_flags() {
        for direction in [Direction::Initial, Direction::Forward, Direction::Backward] {
            let w = finalize_page(Vec::<i64>::new(), 5, direction);
            assert!(w.rows.is_empty());
            assert!(!w.has_next);
            assert!(!w.has_prev);
        }
    }

    #[test]
    fn test_tokens_come_from_edges() {
        let page = finalize_page(vec![30, 20, 10], 2, Direction::Forward).into_page(2, anchor);
        assert_eq!(page.items, vec![30, 20]);
        assert_eq!(page.paginator.size, 2);
        assert_eq!(page.paginator.limit, 2);

        let next = Anchor::<i64>::decode(page.paginator.next_token.as_deref().unwrap()).unwrap();
        let prev = Anchor::<i64>::decode(page.paginator.prev_token.as_deref().unwrap()).unwrap();
        assert_eq!(next, anchor(&20));
        assert_eq!(prev, anchor(&30));
    }

    #[test]
    fn test_no_tokens_when_no_more() {
        let page = finalize_page(vec![30], 2, Direction::Initial).into_page(2, anchor);
        assert!(!page.paginator.has_next());
        assert!(!page.paginator.has_prev());
    }

    #[test]
    fn test_absent_tokens_are_omitted() {
        let page = finalize_page(vec![30], 2, Direction::Initial).into_page(2, anchor);
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(json, r#"{"items":[30],"paginator":{"size":1,"limit":2}}"#);
    }

    #[test]
    fn test_paginator_deserializes_without_tokens() {
        let p: Paginator = serde_json::from_str(r#"{"size":0,"limit":10}"#).unwrap();
        assert_eq!(p, Paginator::new(0, 10));
    }

    #[test]
    fn test_map_keeps_paginator() {
        let page = finalize_page(vec![30, 20, 10], 2, Direction::Initial).into_page(2, anchor);
        let mapped = page.clone().map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["30".to_string(), "20".to_string()]);
        assert_eq!(mapped.paginator, page.paginator);
    }
}
