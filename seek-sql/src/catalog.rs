//! Entity catalog: the built-in admin entities and a TOML loader.
//!
//! ```toml
//! [limits]
//! max = 50
//!
//! [[entity]]
//! name = "users"
//! table = "users"
//! alias = "u"
//! id_column = "id"
//! order_column = "serial"
//! order_key = "serial"          # or "timestamp"
//! filter = ["email", "status"]
//! sort = ["email", "created_at"]
//! fields = ["email", "status", "created_at"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::grammar::{GrammarError, Whitelist};
use crate::listing::{EntitySpec, PageLimits};
use crate::pagination::OrderKeyKind;

const USERS: &[&str] = &[
    "id",
    "email",
    "first_name",
    "last_name",
    "status",
    "created_at",
    "updated_at",
];
const ROLES: &[&str] = &["id", "name", "description", "created_at", "updated_at"];
const POLICIES: &[&str] = &[
    "id",
    "name",
    "effect",
    "action",
    "role_id",
    "resource_id",
    "created_at",
];
const RESOURCES: &[&str] = &["id", "name", "kind", "project_id", "created_at"];
const PROJECTS: &[&str] = &["id", "name", "owner_id", "status", "created_at"];
const PRODUCTS: &[&str] = &["id", "name", "sku", "price", "project_id", "created_at"];

/// A set of named entities plus shared page limits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    limits: PageLimits,
    entities: Vec<EntitySpec>,
}

impl Catalog {
    /// The admin backend's entities.
    ///
    /// | entity | alias | order column |
    /// |--------|-------|--------------|
    /// | users | u | serial |
    /// | roles | r | serial |
    /// | policies | p | serial |
    /// | resources | rs | serial |
    /// | projects | pj | `created_at` |
    /// | products | pd | `created_at` |
    pub fn builtin() -> Self {
        let serial = |name: &str, alias: &str, columns: &[&str]| {
            EntitySpec::new(name, name, alias, "id", "serial", OrderKeyKind::Serial)
                .with_columns(Whitelist::new(columns))
        };
        let timestamped = |name: &str, alias: &str, columns: &[&str]| {
            EntitySpec::new(name, name, alias, "id", "created_at", OrderKeyKind::Timestamp)
                .with_columns(Whitelist::new(columns))
        };

        Self {
            limits: PageLimits::default(),
            entities: vec![
                serial("users", "u", USERS),
                serial("roles", "r", ROLES),
                serial("policies", "p", POLICIES),
                serial("resources", "rs", RESOURCES),
                timestamped("projects", "pj", PROJECTS),
                timestamped("products", "pd", PRODUCTS),
            ],
        }
    }

    /// Build a catalog from entity specs. Names must be unique.
    pub fn new(limits: PageLimits, entities: Vec<EntitySpec>) -> Result<Self, CatalogError> {
        for (i, entity) in entities.iter().enumerate() {
            if entities.iter().take(i).any(|e| e.name() == entity.name()) {
                return Err(CatalogError::DuplicateEntity(entity.name().to_string()));
            }
        }
        Ok(Self { limits, entities })
    }

    /// Parse a TOML catalog.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = toml::from_str(content).map_err(|e| CatalogError::Parse {
            detail: e.to_string(),
        })?;

        let entities = raw
            .entities
            .into_iter()
            .map(RawEntity::into_spec)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(raw.limits, entities)
    }

    /// Read and parse a TOML catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            entities = catalog.entities.len(),
            max_limit = catalog.limits.max,
            "loaded entity catalog"
        );
        Ok(catalog)
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&EntitySpec> {
        self.entities.iter().find(|e| e.name() == name)
    }

    /// All entities in declaration order.
    pub fn entities(&self) -> &[EntitySpec] {
        &self.entities
    }

    /// Shared page limits.
    pub const fn limits(&self) -> PageLimits {
        self.limits
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    #[serde(default)]
    limits: PageLimits,
    #[serde(default, rename = "entity")]
    entities: Vec<RawEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntity {
    name: String,
    table: String,
    alias: String,
    #[serde(default = "default_id_column")]
    id_column: String,
    order_column: String,
    order_key: OrderKeyKind,
    #[serde(default)]
    filter: Vec<String>,
    #[serde(default)]
    sort: Vec<String>,
    #[serde(default)]
    fields: Vec<String>,
}

fn default_id_column() -> String {
    "id".to_string()
}

impl RawEntity {
    fn into_spec(self) -> Result<EntitySpec, CatalogError> {
        let name = self.name;
        let invalid = |source| CatalogError::InvalidEntity {
            entity: name.clone(),
            source,
        };

        let filter = Whitelist::try_new(&self.filter).map_err(invalid)?;
        let sort = Whitelist::try_new(&self.sort).map_err(invalid)?;
        let fields = Whitelist::try_new(&self.fields).map_err(invalid)?;

        EntitySpec::try_new(
            &name,
            &self.table,
            &self.alias,
            &self.id_column,
            &self.order_column,
            self.order_key,
        )
        .map(|spec| spec.with_filter(filter).with_sort(sort).with_fields(fields))
        .map_err(invalid)
    }
}

/// Errors from building or loading a catalog.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The TOML is malformed or has unknown keys.
    #[error("failed to parse catalog: {detail}")]
    Parse {
        /// Parser message.
        detail: String,
    },
    /// An entity names an invalid identifier or reserved column.
    #[error("invalid entity `{entity}`: {source}")]
    InvalidEntity {
        /// Entity name.
        entity: String,
        /// What was wrong.
        source: GrammarError,
    },
    /// Two entities share a name.
    #[error("duplicate entity `{0}`")]
    DuplicateEntity(String),
    /// No entity with this name.
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),
    /// The entity's order column is a different kind than the listing's key type.
    #[error("entity `{entity}` is ordered by a {configured} key, not a {requested} key")]
    KeyKindMismatch {
        /// Entity name.
        entity: String,
        /// Kind in the catalog.
        configured: OrderKeyKind,
        /// Kind of the listing's key type.
        requested: OrderKeyKind,
    },
}
