//! Field-selection lists: `id,email,status`.

use super::{GrammarError, Whitelist};

/// A validated, de-duplicated list of columns to select.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList {
    columns: Vec<String>,
}

impl FieldList {
    /// Columns in request order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether no field was requested (select the default set).
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Parse a comma-separated field list against a whitelist.
pub fn parse_fields(whitelist: &Whitelist, input: &str) -> Result<FieldList, GrammarError> {
    if input.trim().is_empty() {
        return Ok(FieldList::default());
    }
    if whitelist.is_empty() {
        return Err(GrammarError::EmptyWhitelist);
    }

    let mut columns: Vec<String> = Vec::new();
    for part in input.split(',') {
        let column = part.trim();
        if column.is_empty() {
            return Err(GrammarError::EmptyTerm);
        }
        if !whitelist.contains(column) {
            return Err(GrammarError::ColumnNotAllowed(column.to_string()));
        }
        if !columns.iter().any(|c| c == column) {
            columns.push(column.to_string());
        }
    }

    Ok(FieldList { columns })
}

/// Whether `input` is a valid field list for `whitelist`.
pub fn validate_fields(whitelist: &Whitelist, input: &str) -> bool {
    parse_fields(whitelist, input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wl() -> Whitelist {
        Whitelist::new(&["id", "email", "status"])
    }

    #[test]
    fn test_empty_is_valid() {
        assert!(validate_fields(&wl(), ""));
        assert!(validate_fields(&wl(), "   "));
        assert!(validate_fields(&Whitelist::empty(), ""));
    }

    #[test]
    fn test_trims_and_dedupes() {
        let fields = parse_fields(&wl(), " email , id,email").unwrap();
        assert_eq!(fields.columns(), &["email".to_string(), "id".to_string()]);
    }

    #[test]
    fn test_unknown_column() {
        assert_eq!(
            parse_fields(&wl(), "id,password"),
            Err(GrammarError::ColumnNotAllowed("password".into()))
        );
    }

    #[test]
    fn test_empty_item() {
        assert_eq!(parse_fields(&wl(), "id,,email"), Err(GrammarError::EmptyTerm));
        assert_eq!(parse_fields(&wl(), "id,"), Err(GrammarError::EmptyTerm));
    }

    #[test]
    fn test_empty_whitelist_rejects_everything() {
        assert_eq!(
            parse_fields(&Whitelist::empty(), "id"),
            Err(GrammarError::EmptyWhitelist)
        );
    }

    #[test]
    fn test_no_qualified_names() {
        assert!(!validate_fields(&wl(), "u.id"));
        assert!(!validate_fields(&wl(), "id email"));
    }
}
