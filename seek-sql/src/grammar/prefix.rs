//! Table-qualifier injection for filter text.

use super::Whitelist;

/// Prefix every whitelisted column occurrence in `filter` with `prefix`.
///
/// Text between matching single or double quotes is copied untouched, so a
/// literal that happens to spell a column name is never rewritten. Columns
/// match on whole-word boundaries, longest name first (`user_id` is not seen
/// as `id`). An unterminated quote protects the rest of the input.
///
/// Not idempotent: applying it twice qualifies twice.
///
/// # Example
///
/// ```
/// use seek_sql::{Whitelist, inject_prefix};
///
/// let whitelist = Whitelist::new(&["id", "name"]);
/// assert_eq!(inject_prefix("t.", "name='id'", &whitelist), "t.name='id'");
/// ```
pub fn inject_prefix(prefix: &str, filter: &str, whitelist: &Whitelist) -> String {
    let Some(pattern) = whitelist.pattern() else {
        return filter.to_string();
    };

    let mut out = String::with_capacity(filter.len() + prefix.len() * 4);
    let mut rest = filter;

    while !rest.is_empty() {
        let quote_at = rest.find(['\'', '"']);
        let (unquoted, tail) = rest.split_at(quote_at.unwrap_or(rest.len()));

        out.push_str(&pattern.replace_all(unquoted, |caps: &regex::Captures<'_>| {
            format!("{prefix}{}", &caps[0])
        }));

        let mut chars = tail.chars();
        let Some(quote) = chars.next() else {
            break;
        };
        // Copy through the closing quote (or to the end if there is none).
        let body = chars.as_str();
        let quoted_len = body.find(quote).map_or(tail.len(), |end| end + 2 * quote.len_utf8());
        let (quoted, after) = tail.split_at(quoted_len);
        out.push_str(quoted);
        rest = after;
    }

    out
}
