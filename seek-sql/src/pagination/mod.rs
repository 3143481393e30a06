//! Keyset pagination: cursor tokens, direction, criteria and page assembly.
//!
//! # Request Flow
//!
//! | Step | Function | Output |
//! |------|----------|--------|
//! | 1 | [`resolve`] | [`Seek`]: initial, after an anchor, or before one |
//! | 2 | [`build_criteria`] | parameterised `WHERE` + fetch order |
//! | 3 | store | up to `limit + 1` rows |
//! | 4 | [`finalize_page`] | trimmed rows in display order + look-ahead flags |
//! | 5 | [`PageWindow::into_page`] | [`Page`] with `next_token` / `prev_token` |
//!
//! Display order is always `order key DESC, row id DESC`, whichever way the
//! request paged.
//!
//! # Example
//!
//! ```
//! use seek_sql::{Anchor, Direction, finalize_page, resolve};
//! use uuid::Uuid;
//!
//! let seek = resolve::<i64>(None, None).unwrap();
//! assert_eq!(seek.direction(), Direction::Initial);
//!
//! // Three rows fetched for limit = 2: the third is the look-ahead.
//! let page = finalize_page(vec![30_i64, 20, 10], 2, seek.direction())
//!     .into_page(2, |serial| Anchor::new(Uuid::nil(), *serial));
//!
//! assert_eq!(page.items, vec![30, 20]);
//! let next = Anchor::<i64>::decode(page.paginator.next_token.as_deref().unwrap()).unwrap();
//! assert_eq!(next.order_key, 20);
//! assert!(page.paginator.prev_token.is_none());
//! ```

mod criteria;
mod cursor;
mod direction;
mod encoding;
mod page;

pub use criteria::{Criteria, KeysetColumns, build_criteria};
pub use cursor::{
    Anchor, CursorError, MAX_TOKEN_LEN, OrderKey, OrderKeyKind, decode_cursor, encode_cursor,
};
pub use direction::{Direction, Seek, TokenError, TokenField, resolve};
pub use page::{Page, PageWindow, Paginator, finalize_page};
