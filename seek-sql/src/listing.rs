//! One generic listing engine for every entity.
//!
//! An [`EntitySpec`] captures everything that differs between entities (table,
//! alias, keyset columns, whitelists). A [`Listing`] binds it to a SQL dialect
//! and an order-key type and turns a raw [`ListRequest`] into a parameterised
//! query, then turns the fetched rows into a [`Page`].

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError};
use crate::dialect::Dialect;
use crate::grammar::{
    GrammarError, SortExpression, Whitelist, assert_valid_sql_identifier, is_valid_sql_identifier,
    parse_fields, parse_filter, parse_sort,
};
use crate::pagination::{
    Anchor, CursorError, Direction, KeysetColumns, OrderKey, OrderKeyKind, Page, Seek,
    TokenError, TokenField, build_criteria, finalize_page, resolve,
};
use crate::value::Value;

/// Default upper bound for `limit`.
pub const DEFAULT_MAX_LIMIT: u32 = 100;

/// Bounds on the requested page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageLimits {
    /// Largest accepted `limit`.
    pub max: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_LIMIT,
        }
    }
}

impl PageLimits {
    /// Limits with the given maximum.
    pub const fn new(max: u32) -> Self {
        Self { max }
    }

    /// Accept `1..=max`.
    pub fn check(self, limit: i64) -> Result<u32, ListError> {
        u32::try_from(limit)
            .ok()
            .filter(|l| (1..=self.max).contains(l))
            .ok_or(ListError::InvalidLimit {
                limit,
                max: self.max,
            })
    }
}

/// Immutable description of one listable entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpec {
    name: String,
    table: String,
    alias: String,
    keyset: KeysetColumns,
    order_key: OrderKeyKind,
    filter: Whitelist,
    sort: Whitelist,
    fields: Whitelist,
}

impl EntitySpec {
    /// Describe an entity from compile-time names. Whitelists start empty.
    ///
    /// # Panics
    ///
    /// Panics if the table, alias or a key column is not a valid SQL identifier.
    pub fn new(
        name: &str,
        table: &str,
        alias: &str,
        id_column: &str,
        order_column: &str,
        order_key: OrderKeyKind,
    ) -> Self {
        assert_valid_sql_identifier(table, "table");
        assert_valid_sql_identifier(alias, "alias");
        assert_valid_sql_identifier(id_column, "id column");
        assert_valid_sql_identifier(order_column, "order column");
        Self::build(name, table, alias, id_column, order_column, order_key)
    }

    /// Describe an entity from runtime configuration.
    pub fn try_new(
        name: &str,
        table: &str,
        alias: &str,
        id_column: &str,
        order_column: &str,
        order_key: OrderKeyKind,
    ) -> Result<Self, GrammarError> {
        for ident in [table, alias, id_column, order_column] {
            if !is_valid_sql_identifier(ident) {
                return Err(GrammarError::InvalidIdentifier(ident.to_string()));
            }
        }
        Ok(Self::build(name, table, alias, id_column, order_column, order_key))
    }

    fn build(
        name: &str,
        table: &str,
        alias: &str,
        id_column: &str,
        order_column: &str,
        order_key: OrderKeyKind,
    ) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            alias: alias.to_string(),
            keyset: KeysetColumns::new(id_column, order_column),
            order_key,
            filter: Whitelist::empty(),
            sort: Whitelist::empty(),
            fields: Whitelist::empty(),
        }
    }

    /// Columns allowed in `filter`.
    #[must_use]
    pub fn with_filter(mut self, whitelist: Whitelist) -> Self {
        self.filter = whitelist;
        self
    }

    /// Columns allowed in `sort`.
    #[must_use]
    pub fn with_sort(mut self, whitelist: Whitelist) -> Self {
        self.sort = whitelist;
        self
    }

    /// Columns allowed in `fields`; also the default selection.
    #[must_use]
    pub fn with_fields(mut self, whitelist: Whitelist) -> Self {
        self.fields = whitelist;
        self
    }

    /// Use one whitelist for filter, sort and fields.
    #[must_use]
    pub fn with_columns(self, whitelist: Whitelist) -> Self {
        self.with_filter(whitelist.clone())
            .with_sort(whitelist.clone())
            .with_fields(whitelist)
    }

    /// Entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table alias used to qualify columns.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Row id and order key columns.
    pub const fn keyset(&self) -> &KeysetColumns {
        &self.keyset
    }

    /// Kind of the order column.
    pub const fn order_key(&self) -> OrderKeyKind {
        self.order_key
    }

    /// Filter whitelist.
    pub const fn filter_whitelist(&self) -> &Whitelist {
        &self.filter
    }

    /// Sort whitelist.
    pub const fn sort_whitelist(&self) -> &Whitelist {
        &self.sort
    }

    /// Field whitelist.
    pub const fn fields_whitelist(&self) -> &Whitelist {
        &self.fields
    }
}

/// Raw list parameters as they arrive from the request layer.
///
/// Empty strings mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRequest {
    /// Requested page size.
    pub limit: i64,
    /// Sort expression.
    pub sort: String,
    /// Filter expression.
    pub filter: String,
    /// Comma-separated field list.
    pub fields: String,
    /// Token from a previous page's `next_token`.
    pub next_token: String,
    /// Token from a previous page's `prev_token`.
    pub prev_token: String,
}

impl ListRequest {
    /// A first-page request.
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Set the sort expression.
    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// Set the filter expression.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set the field list.
    #[must_use]
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    /// Set the next token.
    #[must_use]
    pub fn next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = token.into();
        self
    }

    /// Set the previous token.
    #[must_use]
    pub fn prev_token(mut self, token: impl Into<String>) -> Self {
        self.prev_token = token.into();
        self
    }
}

/// Result of building a query: SQL string and parameters.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "QueryResult must be used to execute the query"]
pub struct QueryResult {
    /// SQL text with dialect placeholders.
    pub sql: String,
    /// Bind values in placeholder order.
    pub params: Vec<Value>,
}

/// A validated request, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery<K> {
    /// The `SELECT` to execute.
    pub query: QueryResult,
    /// Where the page starts.
    pub seek: Seek<K>,
    /// Validated page size.
    pub limit: u32,
    /// Validated client sort. Rows are still paged in keyset order.
    pub sort: SortExpression,
    /// Selected columns, unqualified, in select order.
    pub columns: Vec<String>,
}

impl<K> PreparedQuery<K> {
    /// Paging direction.
    pub const fn direction(&self) -> Direction {
        self.seek.direction()
    }
}

/// Executes prepared queries. The relational engine lives behind this seam.
pub trait Store {
    /// Row type produced by the store.
    type Row;
    /// Store failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run `query` and return every row it yields.
    fn fetch(&self, query: &QueryResult) -> Result<Vec<Self::Row>, Self::Error>;
}

/// Keyset listing for one entity.
///
/// # Example
///
/// ```
/// use seek_sql::{EntitySpec, ListRequest, Listing, OrderKeyKind, PageLimits, Postgres, Whitelist};
///
/// let users = EntitySpec::new("users", "users", "u", "id", "serial", OrderKeyKind::Serial)
///     .with_columns(Whitelist::new(&["id", "email", "status"]));
/// let listing = Listing::<_, i64>::new(Postgres, users, PageLimits::default()).unwrap();
///
/// let prepared = listing
///     .prepare(&ListRequest::new(2).filter("status='active'"))
///     .unwrap();
/// assert_eq!(
///     prepared.query.sql,
///     "SELECT u.id, u.email, u.status, u.serial FROM users AS u \
///      WHERE u.status = $1 ORDER BY u.serial DESC, u.id DESC LIMIT 3"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Listing<D: Dialect, K: OrderKey> {
    dialect: D,
    entity: EntitySpec,
    limits: PageLimits,
    _key: PhantomData<fn() -> K>,
}

impl<D: Dialect, K: OrderKey> Listing<D, K> {
    /// Bind an entity to a dialect. The entity's order-key kind must be `K`'s.
    pub fn new(dialect: D, entity: EntitySpec, limits: PageLimits) -> Result<Self, CatalogError> {
        if entity.order_key != K::KIND {
            return Err(CatalogError::KeyKindMismatch {
                entity: entity.name,
                configured: entity.order_key,
                requested: K::KIND,
            });
        }
        Ok(Self {
            dialect,
            entity,
            limits,
            _key: PhantomData,
        })
    }

    /// Look up `name` in `catalog` and bind it.
    pub fn from_catalog(dialect: D, catalog: &Catalog, name: &str) -> Result<Self, CatalogError> {
        let entity = catalog
            .entity(name)
            .ok_or_else(|| CatalogError::UnknownEntity(name.to_string()))?;
        Self::new(dialect, entity.clone(), catalog.limits())
    }

    /// The bound entity.
    pub const fn entity(&self) -> &EntitySpec {
        &self.entity
    }

    /// Page size bounds.
    pub const fn limits(&self) -> PageLimits {
        self.limits
    }

    /// Validate `req` and build the `limit + 1` query.
    ///
    /// Validation runs before anything is built, in the order limit, sort,
    /// filter, fields, tokens; the first failure is returned.
    pub fn prepare(&self, req: &ListRequest) -> Result<PreparedQuery<K>, ListError> {
        let entity = &self.entity;

        let limit = self.limits.check(req.limit)?;
        let sort = parse_sort(&entity.sort, &req.sort).map_err(ListError::InvalidSort)?;
        let filter = parse_filter(&entity.filter, &req.filter).map_err(ListError::InvalidFilter)?;
        let fields = parse_fields(&entity.fields, &req.fields).map_err(ListError::InvalidFields)?;
        let seek = resolve::<K>(Some(req.next_token.as_str()), Some(req.prev_token.as_str()))?;

        let criteria = build_criteria(
            &self.dialect,
            &seek,
            filter.as_ref(),
            &entity.keyset,
            &entity.alias,
            &entity.filter,
        );

        let mut columns: Vec<String> = if fields.is_empty() {
            entity.fields.columns().to_vec()
        } else {
            fields.columns().to_vec()
        };
        for key in [&entity.keyset.id, &entity.keyset.order] {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }

        let prefix = format!("{}.", entity.alias);
        let select = columns
            .iter()
            .map(|c| format!("{prefix}{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {select} FROM {} AS {}", entity.table, entity.alias);
        if criteria.predicate.is_some() {
            sql.push(' ');
            sql.push_str(&criteria.where_sql());
        }
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {}",
            criteria.order_by_sql(&prefix),
            u64::from(limit) + 1
        ));

        tracing::debug!(
            entity = %entity.name,
            direction = ?seek.direction(),
            limit,
            sql = %sql,
            "prepared listing query"
        );

        Ok(PreparedQuery {
            query: QueryResult {
                sql,
                params: criteria.params,
            },
            seek,
            limit,
            sort,
            columns,
        })
    }

    /// Trim fetched rows and mint tokens.
    pub fn finalize<R, F>(&self, prepared: &PreparedQuery<K>, rows: Vec<R>, anchor_of: F) -> Page<R>
    where
        F: Fn(&R) -> Anchor<K>,
    {
        let limit = usize::try_from(prepared.limit).unwrap_or(usize::MAX);
        finalize_page(rows, limit, prepared.direction()).into_page(prepared.limit, anchor_of)
    }

    /// Prepare, fetch and finalize in one call.
    pub fn list<S, F>(
        &self,
        store: &S,
        req: &ListRequest,
        anchor_of: F,
    ) -> Result<Page<S::Row>, ListError>
    where
        S: Store,
        F: Fn(&S::Row) -> Anchor<K>,
    {
        let prepared = self.prepare(req)?;
        let rows = store
            .fetch(&prepared.query)
            .map_err(|e| ListError::Store(Box::new(e)))?;
        Ok(self.finalize(&prepared, rows, anchor_of))
    }

    /// Decode a token outside of a request.
    pub fn decode_token(&self, token: &str) -> Result<Anchor<K>, ListError> {
        Ok(Anchor::decode(token)?)
    }
}

/// Request-level failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ListError {
    /// `limit` is below 1 or above the configured maximum.
    #[error("invalid limit {limit}: must be between 1 and {max}")]
    InvalidLimit {
        /// Requested limit.
        limit: i64,
        /// Configured maximum.
        max: u32,
    },
    /// `sort` failed validation.
    #[error("invalid sort: {0}")]
    InvalidSort(#[source] GrammarError),
    /// `filter` failed validation.
    #[error("invalid filter: {0}")]
    InvalidFilter(#[source] GrammarError),
    /// `fields` failed validation.
    #[error("invalid fields: {0}")]
    InvalidFields(#[source] GrammarError),
    /// `next_token` did not decode.
    #[error("invalid next_token: {0}")]
    InvalidNextToken(#[source] CursorError),
    /// `prev_token` did not decode.
    #[error("invalid prev_token: {0}")]
    InvalidPrevToken(#[source] CursorError),
    /// A token not tied to a request field did not decode.
    #[error("invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),
    /// The store failed.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ListError {
    /// Whether the caller sent bad input (as opposed to a store failure).
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    /// Request parameter at fault, if any.
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidLimit { .. } => Some("limit"),
            Self::InvalidSort(_) => Some("sort"),
            Self::InvalidFilter(_) => Some("filter"),
            Self::InvalidFields(_) => Some("fields"),
            Self::InvalidNextToken(_) => Some(TokenField::Next.as_str()),
            Self::InvalidPrevToken(_) => Some(TokenField::Prev.as_str()),
            Self::InvalidCursor(_) | Self::Store(_) => None,
        }
    }
}

impl From<TokenError> for ListError {
    fn from(e: TokenError) -> Self {
        match e.field {
            TokenField::Next => Self::InvalidNextToken(e.source),
            TokenField::Prev => Self::InvalidPrevToken(e.source),
        }
    }
}
