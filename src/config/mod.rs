//! Gateway configuration
//!
//! Settings come from an optional JSON file, then environment variables
//! override individual fields:
//!
//! | Variable | Field |
//! |---|---|
//! | `SUPABASE_URL` | `backend_url` |
//! | `SUPABASE_KEY`, falling back to `SUPABASE_ANON_KEY` | `backend_key` |
//! | `INTERNAL_API_KEY` | `api_key` |
//! | `SCHEMA_CACHE_TTL_SECS` | `schema_cache_ttl_secs` |
//! | `BACKEND_TIMEOUT_MS` | `backend_timeout_ms` |
//! | `ALLOWED_TABLES` | `allowed_tables` (comma-separated) |
//! | `TABLEGATE_HOST` / `TABLEGATE_PORT` | `http.host` / `http.port` |
//!
//! Empty environment values count as unset.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::HandlerConfig;
use crate::backend::PostgrestConfig;
use crate::http_server::HttpServerConfig;
use crate::observability::LogFormat;
use crate::query::{PaginationLimits, DEFAULT_LIMIT, MAX_LIMIT};
use crate::schema::ResolverConfig;

/// Complete gateway configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Backend REST root, e.g. `https://project.supabase.co`
    #[serde(default)]
    pub backend_url: String,

    /// Credential sent to the backend
    #[serde(default)]
    pub backend_key: String,

    /// Shared key callers present in `X-API-Key`
    #[serde(default)]
    pub api_key: String,

    /// Schema cache TTL in seconds (default: 300, 0 disables caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub schema_cache_ttl_secs: u64,

    /// Time budget per backend call in milliseconds (default: 10000)
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,

    #[serde(default = "default_limit")]
    pub default_limit: u64,

    #[serde(default = "default_max_limit")]
    pub max_limit: u64,

    /// Only these tables are exposed when set
    #[serde(default)]
    pub allowed_tables: Option<Vec<String>>,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_backend_timeout_ms() -> u64 {
    10_000
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

fn default_max_limit() -> u64 {
    MAX_LIMIT
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            backend_key: String::new(),
            api_key: String::new(),
            schema_cache_ttl_secs: default_cache_ttl_secs(),
            backend_timeout_ms: default_backend_timeout_ms(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            allowed_tables: None,
            http: HttpServerConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("backend_url", &self.backend_url)
            .field("backend_key", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("schema_cache_ttl_secs", &self.schema_cache_ttl_secs)
            .field("backend_timeout_ms", &self.backend_timeout_ms)
            .field("default_limit", &self.default_limit)
            .field("max_limit", &self.max_limit)
            .field("allowed_tables", &self.allowed_tables)
            .field("http", &self.http)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl GatewayConfig {
    /// Load from an optional file, apply the process environment, and validate
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file without validating it
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Override fields from environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("SUPABASE_URL") {
            self.backend_url = url;
        }
        if let Some(key) = var("SUPABASE_KEY").or_else(|| var("SUPABASE_ANON_KEY")) {
            self.backend_key = key;
        }
        if let Some(key) = var("INTERNAL_API_KEY") {
            self.api_key = key;
        }
        if let Some(raw) = var("SCHEMA_CACHE_TTL_SECS") {
            self.schema_cache_ttl_secs = parse_number("SCHEMA_CACHE_TTL_SECS", &raw)?;
        }
        if let Some(raw) = var("BACKEND_TIMEOUT_MS") {
            self.backend_timeout_ms = parse_number("BACKEND_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = var("ALLOWED_TABLES") {
            let tables: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            self.allowed_tables = Some(tables);
        }
        if let Some(host) = var("TABLEGATE_HOST") {
            self.http.host = host;
        }
        if let Some(raw) = var("TABLEGATE_PORT") {
            self.http.port = parse_number("TABLEGATE_PORT", &raw)?;
        }

        Ok(())
    }

    /// Check required settings and ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::Missing("SUPABASE_URL"));
        }
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "SUPABASE_URL",
                format!("'{}' is not an http(s) URL", self.backend_url),
            ));
        }
        if self.backend_key.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_KEY"));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing("INTERNAL_API_KEY"));
        }
        if self.backend_timeout_ms == 0 {
            return Err(ConfigError::invalid("BACKEND_TIMEOUT_MS", "must be > 0"));
        }
        if self.max_limit == 0 {
            return Err(ConfigError::invalid("max_limit", "must be > 0"));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::invalid(
                "default_limit",
                format!("must be between 1 and max_limit ({})", self.max_limit),
            ));
        }
        Ok(())
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    pub fn pagination_limits(&self) -> PaginationLimits {
        PaginationLimits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            cache_ttl: Duration::from_secs(self.schema_cache_ttl_secs),
            call_timeout: self.backend_timeout(),
            allowed_tables: self
                .allowed_tables
                .as_ref()
                .map(|tables| tables.iter().cloned().collect::<BTreeSet<_>>()),
        }
    }

    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            limits: self.pagination_limits(),
            execute_timeout: self.backend_timeout(),
        }
    }

    pub fn postgrest_config(&self) -> PostgrestConfig {
        PostgrestConfig {
            base_url: self.backend_url.trim_end_matches('/').to_string(),
            api_key: self.backend_key.clone(),
            timeout: self.backend_timeout(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> ConfigResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(name, format!("'{}' is not a valid number", raw)))
}
