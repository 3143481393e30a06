// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Code items in docs - extensive doc changes needed
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy
#![allow(clippy::missing_panics_doc)] // # Panics sections - doc-heavy
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::return_self_not_must_use)] // Builder pattern methods return Self by design
#![allow(clippy::must_use_candidate)] // Builder methods - fluent API doesn't need must_use
#![allow(clippy::format_push_string)] // String building style preference
#![allow(clippy::double_must_use)] // Functions returning must_use types can have their own docs

//! # seek-sql - Keyset Pagination for Filtered Listings
//!
//! Turns the raw `limit`, `sort`, `filter`, `fields`, `next_token` and
//! `prev_token` parameters of a list endpoint into one parameterised SQL
//! query, and the rows it returns into a page with opaque cursor tokens.
//! Supports Postgres and `SQLite` placeholder syntax.
//!
//! ## Quick Start
//!
//! ```
//! # use seek_sql::prelude::*;
//! let listing = Listing::<_, i64>::from_catalog(Postgres, &Catalog::builtin(), "users").unwrap();
//!
//! let prepared = listing
//!     .prepare(&ListRequest::new(20).filter("status='active' AND email='a@b.c'"))
//!     .unwrap();
//!
//! assert!(prepared.query.sql.contains("WHERE u.status = $1 AND u.email = $2"));
//! assert!(prepared.query.sql.ends_with("ORDER BY u.serial DESC, u.id DESC LIMIT 21"));
//! assert_eq!(prepared.query.params.len(), 2);
//! ```
//!
//! ## Components
//!
//! | Component | Entry points |
//! |-----------|--------------|
//! | Cursor codec | [`encode_cursor`], [`decode_cursor`], [`Anchor`] |
//! | Direction resolver | [`resolve`], [`Seek`], [`Direction`] |
//! | Criteria builder | [`build_criteria`], [`finalize_page`], [`Page`] |
//! | Grammar | [`validate_filter`], [`validate_sort`], [`validate_fields`], [`inject_prefix`] |
//! | Orchestration | [`Listing`], [`EntitySpec`], [`Catalog`] |
//!
//! ## Paging
//!
//! Every page is ordered by the entity's order key, newest or largest first,
//! with the row id as tie-breaker. Tokens are absent, never empty, when no
//! page exists in that direction:
//!
//! ```
//! # use seek_sql::prelude::*;
//! # use uuid::Uuid;
//! let listing = Listing::<_, i64>::from_catalog(Sqlite, &Catalog::builtin(), "roles").unwrap();
//! let prepared = listing.prepare(&ListRequest::new(2)).unwrap();
//!
//! // Rows as the store returned them, including the look-ahead row.
//! let rows: Vec<(Uuid, i64)> = [3, 2, 1]
//!     .into_iter()
//!     .map(|n| (Uuid::from_u128(n), i64::try_from(n * 10).unwrap()))
//!     .collect();
//! let page = listing.finalize(&prepared, rows, |(id, serial)| Anchor::new(*id, *serial));
//!
//! assert_eq!(page.items.len(), 2);
//! assert!(page.paginator.next_token.is_some());
//! assert!(page.paginator.prev_token.is_none());
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and installs no subscriber: a warning
//! when both tokens are supplied, debug events for prepared queries and
//! rejected tokens, trace events from page assembly.

mod catalog;
mod dialect;
mod grammar;
mod listing;
mod pagination;
mod value;

pub use catalog::{Catalog, CatalogError};
pub use dialect::{Dialect, Postgres, Sqlite};
pub use grammar::{
    Comparator, Connective, FieldList, FilterExpression, GrammarError, Literal, Predicate,
    SortDir, SortExpression, SortField, Whitelist, assert_valid_sql_identifier, inject_prefix,
    is_valid_sql_identifier, parse_fields, parse_filter, parse_sort, validate_fields,
    validate_filter, validate_sort,
};
pub use listing::{
    DEFAULT_MAX_LIMIT, EntitySpec, ListError, ListRequest, Listing, PageLimits, PreparedQuery,
    QueryResult, Store,
};
pub use pagination::{
    Anchor, Criteria, CursorError, Direction, KeysetColumns, MAX_TOKEN_LEN, OrderKey,
    OrderKeyKind, Page, PageWindow, Paginator, Seek, TokenError, TokenField, build_criteria,
    decode_cursor, encode_cursor, finalize_page, resolve,
};
pub use value::Value;

/// Prelude module for convenient imports.
///
/// ```
/// use seek_sql::prelude::*;
/// // Now Listing, ListRequest, Catalog, Postgres, Sqlite, etc. are available
/// let listing = Listing::<_, i64>::from_catalog(Postgres, &Catalog::builtin(), "users").unwrap();
/// assert_eq!(listing.entity().alias(), "u");
/// ```
pub mod prelude {
    pub use crate::{
        Anchor, Catalog, CatalogError, Dialect, Direction, EntitySpec, ListError, ListRequest,
        Listing, OrderKey, OrderKeyKind, Page, PageLimits, Paginator, Postgres, PreparedQuery,
        QueryResult, Sqlite, Store, Value, Whitelist,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn users() -> Listing<Postgres, i64> {
        Listing::from_catalog(Postgres, &Catalog::builtin(), "users").unwrap()
    }

    #[test]
    fn test_grammar_soundness() {
        let whitelist = Whitelist::new(&["id", "name"]);
        assert!(validate_filter(&whitelist, ""));
        assert!(!validate_filter(&Whitelist::empty(), "id=1"));
        assert!(validate_filter(&whitelist, "id=1 AND name='A'"));
        assert!(!validate_filter(&whitelist, "id=1 AND"));
        assert!(!validate_filter(&whitelist, "id"));
    }

    #[test]
    fn test_injection_safety() {
        let whitelist = Whitelist::new(&["id", "name"]);
        assert_eq!(inject_prefix("t.", "name='id'", &whitelist), "t.name='id'");
    }

    #[test]
    fn test_cursor_roundtrip_serial() {
        let id = Uuid::from_u128(0x1234);
        let token = encode_cursor(id, &42_i64);
        assert_eq!(decode_cursor::<i64>(&token).unwrap(), Anchor::new(id, 42));
    }

    #[test]
    fn test_cursor_roundtrip_timestamp() {
        let ts: DateTime<Utc> = "2021-09-01T00:00:00Z".parse().unwrap();
        let token = encode_cursor(Uuid::nil(), &ts);
        assert_eq!(decode_cursor::<DateTime<Utc>>(&token).unwrap().order_key, ts);
    }

    #[test]
    fn test_filter_literal_with_spaces() {
        let prepared = users()
            .prepare(&ListRequest::new(10).filter("first_name='John Doe'"))
            .unwrap();
        assert!(prepared.query.sql.contains("WHERE u.first_name = $1"));
        assert_eq!(prepared.query.params, vec![Value::Text("John Doe".into())]);
    }

    #[test]
    fn test_literal_is_never_sql() {
        let prepared = users()
            .prepare(&ListRequest::new(10).filter("email='x'' OR 1=1 --'"))
            .unwrap();
        assert!(!prepared.query.sql.contains("1=1"));
        assert_eq!(prepared.query.params, vec![Value::Text("x' OR 1=1 --".into())]);
    }

    #[test]
    fn test_backward_request() {
        let token = encode_cursor(Uuid::from_u128(10), &10_i64);
        let prepared = users()
            .prepare(&ListRequest::new(2).prev_token(token))
            .unwrap();
        assert_eq!(prepared.direction(), Direction::Backward);
        assert!(prepared.query.sql.contains("ORDER BY u.serial ASC, u.id ASC"));
    }

    #[test]
    fn test_error_display() {
        let err = users()
            .prepare(&ListRequest::new(10).sort("email sideways"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid sort: unknown sort direction `sideways`"
        );
    }
}

// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================
