//! Schema resolver with a process-wide TTL cache.
//!
//! The table set and each table's schema are held as immutable `Arc`
//! snapshots stamped with their fetch time. Readers clone the `Arc` under a
//! short read lock; a refetch replaces the snapshot under a write lock. No
//! lock is held while a backend call is in flight, so a slow refresh never
//! blocks readers of entries that are still fresh.
//!
//! A table dropped on the backend stops resolving at most one TTL after the
//! drop.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use regex::Regex;

use crate::backend::{bounded, Backend};
use crate::observability::Event;

use super::errors::{SchemaError, SchemaResult};
use super::types::TableSchema;

/// Default freshness window for cached introspection results
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default time budget for one introspection call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Zero disables caching
    pub cache_ttl: Duration,
    pub call_timeout: Duration,
    /// When set, only these tables are ever exposed
    pub allowed_tables: Option<BTreeSet<String>>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            allowed_tables: None,
        }
    }
}

struct Cached<T> {
    value: Arc<T>,
    fetched_at: Instant,
}

impl<T> Cached<T> {
    fn new(value: Arc<T>) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<Arc<T>> {
        (self.fetched_at.elapsed() < ttl).then(|| Arc::clone(&self.value))
    }
}

/// Resolves table names and schemas against the backend
pub struct SchemaResolver {
    backend: Arc<dyn Backend>,
    config: ResolverConfig,
    tables: RwLock<Option<Cached<BTreeSet<String>>>>,
    schemas: RwLock<HashMap<String, Cached<TableSchema>>>,
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]{0,62}$").expect("identifier pattern is valid")
    })
}

/// Whether `name` is a plain SQL identifier
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

impl SchemaResolver {
    pub fn new(backend: Arc<dyn Backend>, config: ResolverConfig) -> Self {
        Self {
            backend,
            config,
            tables: RwLock::new(None),
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// The set of queryable tables
    pub async fn list_tables(&self) -> SchemaResult<Arc<BTreeSet<String>>> {
        let cached = self
            .tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(|c| c.fresh(self.config.cache_ttl));
        if let Some(tables) = cached {
            return Ok(tables);
        }

        self.fetch_tables().await
    }

    /// Schema of one queryable table
    pub async fn describe_table(&self, name: &str) -> SchemaResult<Arc<TableSchema>> {
        if !is_valid_identifier(name) {
            return Err(SchemaError::UnknownTable(name.to_string()));
        }

        let tables = self.list_tables().await?;
        if !tables.contains(name) {
            return Err(SchemaError::UnknownTable(name.to_string()));
        }

        let cached = self
            .schemas
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .and_then(|c| c.fresh(self.config.cache_ttl));
        if let Some(schema) = cached {
            return Ok(schema);
        }

        self.fetch_schema(name).await
    }

    /// Drop every cached entry and refetch the table set
    pub async fn refresh(&self) -> SchemaResult<Arc<BTreeSet<String>>> {
        self.invalidate();
        let tables = self.fetch_tables().await?;
        tracing::info!(event = %Event::SchemaRefreshed, tables = tables.len());
        Ok(tables)
    }

    /// Drop every cached entry; the next call introspects again
    pub fn invalidate(&self) {
        *self.tables.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.schemas
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    async fn fetch_tables(&self) -> SchemaResult<Arc<BTreeSet<String>>> {
        let names = bounded(self.config.call_timeout, self.backend.list_tables())
            .await
            .map_err(|e| self.introspection_failed(None, e.into()))?;

        let mut tables = BTreeSet::new();
        for name in names {
            if !is_valid_identifier(&name) {
                tracing::debug!(table = %name, "skipping table with non-identifier name");
                continue;
            }
            if let Some(allowed) = &self.config.allowed_tables {
                if !allowed.contains(&name) {
                    continue;
                }
            }
            tables.insert(name);
        }
        let tables = Arc::new(tables);

        tracing::debug!(event = %Event::TablesResolved, tables = tables.len());
        *self.tables.write().unwrap_or_else(|e| e.into_inner()) =
            Some(Cached::new(Arc::clone(&tables)));

        Ok(tables)
    }

    async fn fetch_schema(&self, name: &str) -> SchemaResult<Arc<TableSchema>> {
        let schema = bounded(self.config.call_timeout, self.backend.describe_table(name))
            .await
            .map_err(|e| self.introspection_failed(Some(name), e.into()))?;

        if schema.columns.is_empty() {
            return Err(self.introspection_failed(
                Some(name),
                SchemaError::IntrospectionError(format!("table '{}' reported no columns", name)),
            ));
        }

        let schema = Arc::new(schema);
        tracing::debug!(
            event = %Event::SchemaResolved,
            table = name,
            columns = schema.columns.len()
        );
        self.schemas
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), Cached::new(Arc::clone(&schema)));

        Ok(schema)
    }

    fn introspection_failed(&self, table: Option<&str>, err: SchemaError) -> SchemaError {
        if !matches!(err, SchemaError::UnknownTable(_)) {
            tracing::warn!(
                event = %Event::IntrospectionFailed,
                table = table.unwrap_or("*"),
                error = %err
            );
        }
        err
    }
}
