//! Keyset WHERE/ORDER BY generation.

use super::cursor::OrderKey;
use super::direction::{Direction, Seek};
use crate::dialect::Dialect;
use crate::grammar::{FilterExpression, SortDir, SortField, Whitelist, inject_prefix};
use crate::value::Value;

/// The two columns that define keyset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetColumns {
    /// Unique row id, the tie-breaker.
    pub id: String,
    /// Primary order key.
    pub order: String,
}

impl KeysetColumns {
    /// Create keyset columns.
    pub fn new(id: impl Into<String>, order: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            order: order.into(),
        }
    }
}

/// Pre-query output: a parameterised predicate plus the internal sort order.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    /// Combined filter and keyset predicate, if any.
    pub predicate: Option<String>,
    /// Bind values in placeholder order.
    pub params: Vec<Value>,
    /// Order to fetch in: `[order key, row id]`.
    pub order: [SortField; 2],
    /// Next free placeholder index.
    pub next_param_idx: usize,
}

impl Criteria {
    /// `WHERE <predicate>`, or an empty string when nothing constrains the query.
    pub fn where_sql(&self) -> String {
        self.predicate
            .as_ref()
            .map_or_else(String::new, |p| format!("WHERE {p}"))
    }

    /// `ORDER BY` list with both columns qualified by `prefix`.
    pub fn order_by_sql(&self, prefix: &str) -> String {
        let [key, id] = &self.order;
        format!("{}, {}", key.to_sql(prefix), id.to_sql(prefix))
    }
}

/// Compose the seek position and the client filter into [`Criteria`].
///
/// | Direction | Keyset predicate | Fetch order |
/// |-----------|------------------|-------------|
/// | Initial | none | `k DESC, id DESC` |
/// | Forward | `(k <= $a AND (id < $b OR k < $a))` | `k DESC, id DESC` |
/// | Backward | `(k >= $a AND (id > $b OR k > $a))` | `k ASC, id ASC` |
///
/// The filter renders first (placeholders from `$1`), its columns qualified
/// with `alias.`; it is parenthesised whenever a keyset bound follows so an
/// `OR` inside it cannot escape the bound. The anchor key placeholder is
/// reused in both halves of the keyset predicate.
pub fn build_criteria<D: Dialect, K: OrderKey>(
    dialect: &D,
    seek: &Seek<K>,
    filter: Option<&FilterExpression>,
    columns: &KeysetColumns,
    alias: &str,
    filter_whitelist: &Whitelist,
) -> Criteria {
    let prefix = format!("{alias}.");
    let mut params = Vec::new();
    let mut idx = 1;

    let filter_sql = filter.map(|f| {
        let (sql, values, next) = f.to_sql(dialect, idx);
        params.extend(values);
        idx = next;
        inject_prefix(&prefix, &sql, filter_whitelist)
    });

    let bound = match seek {
        Seek::Initial => None,
        Seek::After(anchor) => Some((anchor, '<')),
        Seek::Before(anchor) => Some((anchor, '>')),
    };
    let keyset_sql = bound.map(|(anchor, op)| {
        let key_ph = dialect.param(idx);
        let id_ph = dialect.param(idx + 1);
        params.push(anchor.order_key.to_value());
        params.push(Value::Uuid(anchor.row_id));
        idx += 2;
        keyset_predicate(columns, &prefix, op, &key_ph, &id_ph)
    });

    let predicate = match (filter_sql, keyset_sql) {
        (None, None) => None,
        (Some(f), None) => Some(f),
        (None, Some(k)) => Some(k),
        (Some(f), Some(k)) => Some(format!("({f}) AND {k}")),
    };

    let dir = match seek.direction() {
        Direction::Initial | Direction::Forward => SortDir::Desc,
        Direction::Backward => SortDir::Asc,
    };

    Criteria {
        predicate,
        params,
        order: [
            SortField::new(columns.order.clone(), dir),
            SortField::new(columns.id.clone(), dir),
        ],
        next_param_idx: idx,
    }
}

fn keyset_predicate(
    columns: &KeysetColumns,
    prefix: &str,
    op: char,
    key_ph: &str,
    id_ph: &str,
) -> String {
    let key = format!("{prefix}{}", columns.order);
    let id = format!("{prefix}{}", columns.id);

    // Non-strict on the key so rows tied with the anchor are reached through
    // the id comparison.
    format!("({key} {op}= {key_ph} AND ({id} {op} {id_ph} OR {key} {op} {key_ph}))")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Postgres, Sqlite};
    use crate::grammar::parse_filter;
    use crate::pagination::cursor::Anchor;
    use uuid::Uuid;

    fn columns() -> KeysetColumns {
        KeysetColumns::new("id", "serial")
    }

    fn wl() -> Whitelist {
        Whitelist::new(&["id", "status", "email"])
    }

    fn anchor() -> Anchor<i64> {
        Anchor::new(Uuid::from_u128(20), 20)
    }

    #[test]
    fn test_initial_without_filter() {
        let c = build_criteria(&Postgres, &Seek::<i64>::Initial, None, &columns(), "u", &wl());
        assert_eq!(c.predicate, None);
        assert_eq!(c.where_sql(), "");
        assert!(c.params.is_empty());
        assert_eq!(c.order_by_sql("u."), "u.serial DESC, u.id DESC");
        assert_eq!(c.next_param_idx, 1);
    }

    #[test]
    fn test_initial_with_filter() {
        let filter = parse_filter(&wl(), "status='active' OR id=3").unwrap();
        let c = build_criteria(
            &Postgres,
            &Seek::<i64>::Initial,
            filter.as_ref(),
            &columns(),
            "u",
            &wl(),
        );
        assert_eq!(c.where_sql(), "WHERE u.status = $1 OR u.id = $2");
        assert_eq!(c.params, vec![Value::Text("active".into()), Value::Int(3)]);
    }

    #[test]
    fn test_forward() {
        let c = build_criteria(&Postgres, &Seek::After(anchor()), None, &columns(), "u", &wl());
        insta::assert_snapshot!(c.where_sql(), @"WHERE (u.serial <= $1 AND (u.id < $2 OR u.serial < $1))");
        assert_eq!(c.params, vec![Value::Int(20), Value::Uuid(Uuid::from_u128(20))]);
        assert_eq!(c.order_by_sql("u."), "u.serial DESC, u.id DESC");
        assert_eq!(c.next_param_idx, 3);
    }

    #[test]
    fn test_backward() {
        let c = build_criteria(&Postgres, &Seek::Before(anchor()), None, &columns(), "u", &wl());
        insta::assert_snapshot!(c.where_sql(), @"WHERE (u.serial >= $1 AND (u.id > $2 OR u.serial > $1))");
        assert_eq!(c.order_by_sql("u."), "u.serial ASC, u.id ASC");
    }

    #[test]
    fn test_filter_is_parenthesised_before_keyset() {
        let filter = parse_filter(&wl(), "status='a' OR email='b'").unwrap();
        let c = build_criteria(
            &Sqlite,
            &Seek::After(anchor()),
            filter.as_ref(),
            &columns(),
            "u",
            &wl(),
        );
        insta::assert_snapshot!(
            c.where_sql(),
            @"WHERE (u.status = ?1 OR u.email = ?2) AND (u.serial <= ?3 AND (u.id < ?4 OR u.serial < ?3))"
        );
        assert_eq!(c.params.len(), 4);
        assert_eq!(c.params[2], Value::Int(20));
        assert_eq!(c.next_param_idx, 5);
    }

    #[test]
    fn test_timestamp_anchor_binds_timestamp() {
        let ts = chrono::DateTime::parse_from_rfc3339("2021-09-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let seek = Seek::After(Anchor::new(Uuid::nil(), ts));
        let cols = KeysetColumns::new("id", "created_at");
        let c = build_criteria(&Postgres, &seek, None, &cols, "pj", &Whitelist::empty());
        assert_eq!(c.params[0], Value::Timestamp(ts));
        assert_eq!(c.order_by_sql("pj."), "pj.created_at DESC, pj.id DESC");
    }
}
