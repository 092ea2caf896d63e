//! CLI command implementations
//!
//! `serve` boot sequence:
//! 1. Load and validate configuration (file, then environment)
//! 2. Install the log subscriber
//! 3. Build the backend client and schema resolver
//! 4. Warm the table list (failure is logged, not fatal)
//! 5. Serve until Ctrl-C or SIGTERM

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::api::{ApiKeyGate, TableQueryHandler};
use crate::backend::{Backend, PostgrestBackend};
use crate::config::GatewayConfig;
use crate::http_server::HttpServer;
use crate::observability::{self, Event, LogFormat};
use crate::schema::SchemaResolver;

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::write_json;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve {
            config,
            host,
            port,
            log_format,
        } => serve(config.as_deref(), host, port, log_format),
        Command::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// Load configuration and apply command-line bind overrides
pub fn load_config(
    path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> CliResult<GatewayConfig> {
    let mut config = GatewayConfig::load(path)?;
    if let Some(host) = host {
        config.http.host = host;
    }
    if let Some(port) = port {
        config.http.port = port;
    }
    Ok(config)
}

/// Start the gateway and block until shutdown
pub fn serve(
    path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    log_format: Option<LogFormat>,
) -> CliResult<()> {
    let config = match load_config(path, host, port) {
        Ok(config) => config,
        Err(e) => {
            observability::init(log_format.unwrap_or_default());
            tracing::error!(event = %Event::ConfigInvalid, error = %e);
            return Err(e);
        }
    };

    observability::init(log_format.unwrap_or(config.log_format));
    tracing::info!(event = %Event::BootStart, version = env!("CARGO_PKG_VERSION"));
    tracing::info!(
        event = %Event::ConfigLoaded,
        backend = %config.backend_url,
        bind = %config.http.socket_addr(),
        cache_ttl_secs = config.schema_cache_ttl_secs,
        backend_timeout_ms = config.backend_timeout_ms
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve_async(config))
}

async fn serve_async(config: GatewayConfig) -> CliResult<()> {
    let backend: Arc<dyn Backend> = Arc::new(PostgrestBackend::new(config.postgrest_config())?);
    let resolver = Arc::new(SchemaResolver::new(
        Arc::clone(&backend),
        config.resolver_config(),
    ));

    match resolver.list_tables().await {
        Ok(tables) => tracing::info!(event = %Event::TablesResolved, tables = tables.len()),
        Err(e) => tracing::warn!(
            event = %Event::IntrospectionFailed,
            error = %e,
            "table list unavailable at startup; will retry on first request"
        ),
    }

    let handler = Arc::new(TableQueryHandler::new(
        resolver,
        backend,
        config.handler_config(),
    ));
    let gate = ApiKeyGate::new(&config.api_key);

    HttpServer::new(config.http.clone(), handler, gate)
        .start()
        .await?;

    Ok(())
}

/// Validate configuration and print a redacted summary
pub fn check_config(path: Option<&Path>) -> CliResult<()> {
    let config = GatewayConfig::load(path)?;
    write_json(&config_summary(&config))
}

fn config_summary(config: &GatewayConfig) -> serde_json::Value {
    json!({
        "status": "ok",
        "backend_url": config.backend_url,
        "bind": config.http.socket_addr(),
        "schema_cache_ttl_secs": config.schema_cache_ttl_secs,
        "backend_timeout_ms": config.backend_timeout_ms,
        "default_limit": config.default_limit,
        "max_limit": config.max_limit,
        "allowed_tables": config.allowed_tables,
        "cors_origins": config.http.cors_origins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_omits_secrets() {
        let config = GatewayConfig {
            backend_url: "https://x.supabase.co".into(),
            backend_key: "backend-secret".into(),
            api_key: "api-secret".into(),
            ..Default::default()
        };

        let summary = config_summary(&config).to_string();
        assert!(summary.contains("https://x.supabase.co"));
        assert!(summary.contains("0.0.0.0:8080"));
        assert!(!summary.contains("backend-secret"));
        assert!(!summary.contains("api-secret"));
    }
}
