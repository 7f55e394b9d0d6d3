//! Configuration management for dbx
//!
//! Loads configuration with priority:
//! 1. config.toml (or specified config file)
//! 2. Environment variables (fallback)
//! 3. Defaults

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// dbx configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbxConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Relational store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL, `sqlite://...` or `postgres://...` (can reference env var with ${VAR_NAME})
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Schema introspected on PostgreSQL; ignored for SQLite
    #[serde(default = "default_schema")]
    pub schema: String,
}

/// Limits and knobs for the introspection operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Default cap on data rows returned per table by search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Number of buckets kept in a column value distribution
    #[serde(default = "default_distribution_limit")]
    pub distribution_limit: u32,

    /// Upper bound on concurrent per-table introspection queries
    #[serde(default = "default_fanout_concurrency")]
    pub fanout_concurrency: usize,

    /// Metadata table mapping table-name prefixes to logical databases
    #[serde(default = "default_registry_table")]
    pub registry_table: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Authorization gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token accepted by the API. When unset every API request is refused.
    pub admin_token: Option<String>,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_format")]
    pub log_format: String,

    pub service_name: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            schema: default_schema(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            distribution_limit: default_distribution_limit(),
            fanout_concurrency: default_fanout_concurrency(),
            registry_table: default_registry_table(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            service_name: None,
        }
    }
}

impl DbxConfig {
    /// Load configuration with the following priority:
    /// 1. Specified config file (if provided)
    /// 2. config.toml in current directory or a parent
    /// 3. Environment variables (fallback)
    /// 4. Defaults
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        // A missing .env is fine
        let _ = dotenvy::dotenv();

        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            Self::find_config_file()?
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    /// Parse configuration text and resolve environment references
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: DbxConfig = toml::from_str(contents)?;
        config.resolve_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Find config.toml by searching current directory and parents
    fn find_config_file() -> Result<PathBuf> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join("config.toml");
            if config_path.exists() {
                return Ok(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        Err(anyhow!(
            "config.toml not found. Create one with: cp config.toml.example config.toml"
        ))
    }

    /// Resolve ${VAR_NAME} references to environment variables
    fn resolve_env_vars(&mut self) {
        // database.url falls back to DATABASE_URL
        if self.database.url.is_empty() {
            self.database.url = env::var("DATABASE_URL").unwrap_or_default();
        } else if let Some(resolved) = Self::resolve_env_var(&self.database.url) {
            self.database.url = resolved;
        } else {
            self.database.url = String::new();
        }

        // auth.admin_token falls back to DBX_ADMIN_TOKEN
        self.auth.admin_token = match self.auth.admin_token.take() {
            Some(token) if !token.is_empty() => Self::resolve_env_var(&token),
            _ => env::var("DBX_ADMIN_TOKEN").ok(),
        };
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(anyhow!(
                "database url not configured. Set [database] url in config.toml or export DATABASE_URL"
            ));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.catalog.fanout_concurrency == 0 {
            return Err(anyhow!("catalog.fanout_concurrency must be at least 1"));
        }
        Ok(())
    }

    /// Bind address for the HTTP server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Create test-friendly defaults pointing at the given database URL
    pub fn test_defaults(database_url: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig {
                url: database_url.into(),
                ..Default::default()
            },
            catalog: CatalogConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig {
                admin_token: Some("test-admin-token".to_string()),
            },
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_search_limit() -> u32 {
    100
}

fn default_distribution_limit() -> u32 {
    20
}

fn default_fanout_concurrency() -> usize {
    8
}

fn default_registry_table() -> String {
    "database_registry".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_format() -> String {
    "pretty".to_string()
}
