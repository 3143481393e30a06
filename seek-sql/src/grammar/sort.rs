//! Sort expressions: `email ASC,created_at DESC`.

use super::{GrammarError, Whitelist};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDir {
    /// SQL keyword for this direction.
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    fn parse(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if keyword.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

/// Sort field with direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Column name.
    pub field: String,
    /// Direction.
    pub dir: SortDir,
}

impl SortField {
    /// Create a new sort field.
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }

    /// Render as `<prefix><field> <DIR>`.
    pub fn to_sql(&self, prefix: &str) -> String {
        format!("{prefix}{} {}", self.field, self.dir.as_sql())
    }
}

/// A validated sort expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortExpression {
    fields: Vec<SortField>,
}

impl SortExpression {
    /// Sort terms in request order.
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Whether no sort was requested.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as an `ORDER BY` list with every column qualified by `prefix`.
    pub fn to_sql(&self, prefix: &str) -> String {
        self.fields
            .iter()
            .map(|s| s.to_sql(prefix))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a sort string against a whitelist.
///
/// Every comma-separated term must be exactly a whitelisted column followed by
/// `ASC` or `DESC` (any case). A column without a direction is rejected.
pub fn parse_sort(whitelist: &Whitelist, input: &str) -> Result<SortExpression, GrammarError> {
    if input.trim().is_empty() {
        return Ok(SortExpression::default());
    }
    if whitelist.is_empty() {
        return Err(GrammarError::EmptyWhitelist);
    }

    let mut fields = Vec::new();
    for part in input.split(',') {
        let term = part.trim();
        if term.is_empty() {
            return Err(GrammarError::EmptyTerm);
        }

        let mut words = term.split_whitespace();
        let (Some(column), Some(keyword), None) = (words.next(), words.next(), words.next())
        else {
            return Err(GrammarError::MalformedSortTerm(term.to_string()));
        };

        if !whitelist.contains(column) {
            return Err(GrammarError::ColumnNotAllowed(column.to_string()));
        }
        let dir = SortDir::parse(keyword)
            .ok_or_else(|| GrammarError::InvalidSortDirection(keyword.to_string()))?;

        fields.push(SortField::new(column, dir));
    }

    Ok(SortExpression { fields })
}

/// Whether `input` is a valid sort expression for `whitelist`.
pub fn validate_sort(whitelist: &Whitelist, input: &str) -> bool {
    parse_sort(whitelist, input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wl() -> Whitelist {
        Whitelist::new(&["id", "name", "created_at"])
    }

    #[test]
    fn test_empty_is_valid() {
        assert!(validate_sort(&wl(), ""));
        assert!(validate_sort(&Whitelist::empty(), ""));
    }

    #[test]
    fn test_parse_multiple_terms() {
        let sort = parse_sort(&wl(), "name asc, created_at DESC").unwrap();
        assert_eq!(
            sort.fields(),
            &[
                SortField::new("name", SortDir::Asc),
                SortField::new("created_at", SortDir::Desc),
            ]
        );
        assert_eq!(sort.to_sql("u."), "u.name ASC, u.created_at DESC");
    }

    #[test]
    fn test_direction_is_case_insensitive() {
        assert!(validate_sort(&wl(), "id Desc"));
        assert!(validate_sort(&wl(), "id aSC"));
    }

    #[test]
    fn test_column_without_direction() {
        assert_eq!(
            parse_sort(&wl(), "name"),
            Err(GrammarError::MalformedSortTerm("name".into()))
        );
        assert!(!validate_sort(&wl(), "name ASC, id"));
    }

    #[test]
    fn test_extra_words() {
        assert!(!validate_sort(&wl(), "name ASC NULLS"));
    }

    #[test]
    fn test_unknown_direction() {
        assert_eq!(
            parse_sort(&wl(), "name UP"),
            Err(GrammarError::InvalidSortDirection("UP".into()))
        );
    }

    #[test]
    fn test_column_not_whitelisted() {
        assert_eq!(
            parse_sort(&wl(), "password ASC"),
            Err(GrammarError::ColumnNotAllowed("password".into()))
        );
    }

    #[test]
    fn test_empty_term() {
        assert_eq!(
            parse_sort(&wl(), "name ASC,,id DESC"),
            Err(GrammarError::EmptyTerm)
        );
    }

    #[test]
    fn test_empty_whitelist() {
        assert_eq!(
            parse_sort(&Whitelist::empty(), "id ASC"),
            Err(GrammarError::EmptyWhitelist)
        );
    }
}
