//! Column whitelists and SQL identifier validation.

use std::fmt;

use regex::Regex;

use super::GrammarError;

/// Maximum length for SQL identifiers (`PostgreSQL` limit is 63).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Words the filter and sort grammars treat as keywords. A column with one of
/// these names could never be told apart from the keyword.
const RESERVED: &[&str] = &["and", "or", "asc", "desc"];

/// Validate that a string is a safe SQL identifier.
///
/// A valid SQL identifier:
/// - Starts with a letter (a-z, A-Z) or underscore
/// - Contains only letters, digits (0-9), and underscores
/// - Is not empty and not longer than 63 characters
///
/// # Examples
///
/// ```
/// use seek_sql::is_valid_sql_identifier;
///
/// assert!(is_valid_sql_identifier("users"));
/// assert!(is_valid_sql_identifier("user_id"));
/// assert!(is_valid_sql_identifier("_private"));
///
/// assert!(!is_valid_sql_identifier(""));           // empty
/// assert!(!is_valid_sql_identifier("123abc"));     // starts with digit
/// assert!(!is_valid_sql_identifier("user.id"));    // contains dot
/// assert!(!is_valid_sql_identifier("user; DROP")); // contains special chars
/// ```
#[inline]
#[must_use]
pub fn is_valid_sql_identifier(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_IDENTIFIER_LENGTH {
        return false;
    }

    let mut chars = s.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Assert that a string is a valid SQL identifier.
///
/// # Panics
///
/// Panics with a descriptive error if the identifier is invalid.
/// This is intended for programmer errors (invalid table/column names in code),
/// not for user input validation.
#[inline]
pub fn assert_valid_sql_identifier(s: &str, context: &str) {
    assert!(
        is_valid_sql_identifier(s),
        "Invalid SQL {context} name '{s}': must start with letter/underscore, \
             contain only ASCII alphanumeric/underscore, and be 1-63 chars"
    );
}

/// An immutable set of column names a client may reference.
///
/// Built once per entity and shared read-only across requests. The whole-word
/// pattern used by [`inject_prefix`](crate::inject_prefix) is compiled here,
/// with longer names tried before shorter ones so `user_id` is never read as
/// `user_` + `id`.
#[derive(Clone)]
pub struct Whitelist {
    columns: Vec<String>,
    pattern: Option<Regex>,
}

impl Whitelist {
    /// Build a whitelist from compile-time column names.
    ///
    /// # Panics
    ///
    /// Panics if any name is not a valid SQL identifier or is a grammar keyword.
    pub fn new(columns: &[&str]) -> Self {
        match Self::try_new(columns.iter().copied()) {
            Ok(whitelist) => whitelist,
            Err(e) => panic!("Invalid whitelist: {e}"),
        }
    }

    /// Build a whitelist from runtime configuration.
    pub fn try_new<I, S>(columns: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for column in columns {
            let column = column.as_ref();
            if !is_valid_sql_identifier(column) {
                return Err(GrammarError::InvalidIdentifier(column.to_string()));
            }
            if RESERVED.iter().any(|kw| kw.eq_ignore_ascii_case(column)) {
                return Err(GrammarError::ReservedIdentifier(column.to_string()));
            }
            if !names.iter().any(|n| n == column) {
                names.push(column.to_string());
            }
        }

        let pattern = build_pattern(&names);
        Ok(Self {
            columns: names,
            pattern,
        })
    }

    /// An empty whitelist: every non-empty clause is rejected.
    pub const fn empty() -> Self {
        Self {
            columns: Vec::new(),
            pattern: None,
        }
    }

    /// Whether `column` is allowed (exact, case-sensitive match).
    #[inline]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Allowed columns in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether no column is allowed.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub(crate) const fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }
}

/// Compile `\b(?:longest|...|shortest)\b`.
fn build_pattern(names: &[String]) -> Option<Regex> {
    if names.is_empty() {
        return None;
    }
    let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    // Names are plain identifiers, so they need no escaping and always compile.
    Regex::new(&format!(r"\b(?:{})\b", sorted.join("|"))).ok()
}

impl PartialEq for Whitelist {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Eq for Whitelist {}

impl fmt::Debug for Whitelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Whitelist").field(&self.columns).finish()
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::empty()
    }
}
