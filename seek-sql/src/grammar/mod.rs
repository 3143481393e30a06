//! Client-supplied filter, sort and field-selection grammar.
//!
//! Three small languages arrive as raw query-string values:
//!
//! | Parameter | Shape | Example |
//! |-----------|-------|---------|
//! | `fields`  | comma-separated columns | `id,email,status` |
//! | `sort`    | comma-separated `<column> <ASC\|DESC>` | `email ASC,created_at desc` |
//! | `filter`  | `<column><=\|>\|<><value>` pairs joined by `AND`/`OR` | `status='active' AND serial>10` |
//!
//! Every column named in any of them must be on the entity's [`Whitelist`].
//! Empty input is always valid and means "no clause". The grammar is a
//! safety filter for building predictable SQL, not an expression language:
//! there are no parentheses, no other comparators and no other keywords.
//!
//! # Example
//!
//! ```
//! use seek_sql::{Whitelist, validate_fields, validate_filter, validate_sort};
//!
//! let whitelist = Whitelist::new(&["id", "name"]);
//!
//! assert!(validate_filter(&whitelist, "id=1 AND name='A'"));
//! assert!(!validate_filter(&whitelist, "id=1 AND"));
//! assert!(validate_sort(&whitelist, "name DESC"));
//! assert!(!validate_sort(&whitelist, "name"));
//! assert!(validate_fields(&whitelist, "id, name"));
//! ```

mod fields;
mod filter;
mod prefix;
mod sort;
mod whitelist;

pub use fields::{FieldList, parse_fields, validate_fields};
pub use filter::{
    Comparator, Connective, FilterExpression, Literal, Predicate, parse_filter, validate_filter,
};
pub use prefix::inject_prefix;
pub use sort::{SortDir, SortExpression, SortField, parse_sort, validate_sort};
pub use whitelist::{Whitelist, assert_valid_sql_identifier, is_valid_sql_identifier};

/// Grammar and whitelist validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GrammarError {
    /// Non-empty input against an empty whitelist.
    #[error("no columns are allowed here")]
    EmptyWhitelist,
    /// A referenced column is not whitelisted.
    #[error("column `{0}` is not allowed")]
    ColumnNotAllowed(String),
    /// An empty item in a comma-separated list.
    #[error("empty item in list")]
    EmptyTerm,
    /// A sort term that is not exactly `<column> <direction>`.
    #[error("sort term `{0}` must be `<column> <ASC|DESC>`")]
    MalformedSortTerm(String),
    /// A sort direction other than ASC or DESC.
    #[error("unknown sort direction `{0}`")]
    InvalidSortDirection(String),
    /// A filter term with no `=`, `<` or `>`.
    #[error("filter term `{0}` has no comparator")]
    MissingComparator(String),
    /// A filter value that is neither a quoted string nor a number.
    #[error("invalid filter value in `{0}`")]
    InvalidValue(String),
    /// A single-quoted literal that never closes.
    #[error("unterminated quoted string in filter")]
    UnterminatedQuote,
    /// A keyword between terms other than AND or OR.
    #[error("unknown filter operator `{0}`")]
    UnknownOperator(String),
    /// The filter starts with AND or OR.
    #[error("filter cannot start with operator `{0}`")]
    LeadingOperator(String),
    /// AND or OR with no term after it.
    #[error("operator `{0}` is not followed by a filter term")]
    DanglingOperator(String),
    /// Two terms with no operator between them.
    #[error("missing AND/OR before `{0}`")]
    MissingOperator(String),
    /// A configured column or alias is not a plain SQL identifier.
    #[error("`{0}` is not a valid SQL identifier")]
    InvalidIdentifier(String),
    /// A configured column collides with a grammar keyword.
    #[error("`{0}` is a reserved word")]
    ReservedIdentifier(String),
}
