//! SQL dialect implementations for Postgres and `SQLite`.
//!
//! The engine only needs dialects to differ in how bind placeholders are
//! spelled. Both dialects use numbered placeholders, so a placeholder may
//! appear more than once in a statement and bind the same parameter.

/// SQL dialect trait for database-specific syntax.
pub trait Dialect: Clone + Copy + std::fmt::Debug {
    /// Format a parameter placeholder (e.g., `$1` for Postgres, `?1` for `SQLite`).
    fn param(&self, idx: usize) -> String;

    /// Short name used in log output.
    fn name(&self) -> &'static str;
}

/// Postgres dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    #[inline]
    fn param(&self, idx: usize) -> String {
        format!("${idx}")
    }

    #[inline]
    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// `SQLite` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    #[inline]
    fn param(&self, idx: usize) -> String {
        format!("?{idx}")
    }

    #[inline]
    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_param() {
        assert_eq!(Postgres.param(1), "$1");
        assert_eq!(Postgres.param(12), "$12");
    }

    #[test]
    fn test_sqlite_param() {
        assert_eq!(Sqlite.param(1), "?1");
        assert_eq!(Sqlite.param(12), "?12");
    }
}
