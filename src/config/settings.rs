//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::ReferenceKind;
use crate::shared::pagination::DEFAULT_MAX_PAGE_LIMIT;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// List paging bounds
    pub pagination: PaginationSettings,

    /// Reference entity behaviour
    pub references: ReferenceSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations at startup
    pub run_migrations: bool,
}

/// Paging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    /// Largest `page_limit` a list request may ask for
    pub max_page_limit: i64,
}

/// Reference entity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceSettings {
    /// Table names of the kinds whose create reuses an existing row with
    /// the same name (e.g. `blog_tags`)
    pub dedupe_by_name: Vec<String>,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let settings: Self = Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("pagination.max_page_limit", DEFAULT_MAX_PAGE_LIMIT)?
            .set_default("references.dedupe_by_name", vec!["blog_tags"])?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__PAGINATION__MAX_PAGE_LIMIT=100 -> pagination.max_page_limit = 100
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("references.dedupe_by_name")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.max_page_limit <= 0 {
            return Err(ConfigError::Message(format!(
                "pagination.max_page_limit must be positive, got {}",
                self.pagination.max_page_limit
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Message(format!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if let Some(unknown) = self
            .references
            .dedupe_by_name
            .iter()
            .find(|t| ReferenceKind::from_table(t).is_none())
        {
            return Err(ConfigError::Message(format!(
                "references.dedupe_by_name: unknown reference kind '{}'",
                unknown
            )));
        }

        Ok(())
    }
}

impl DatabaseSettings {
    /// Get the connection URL.
    pub fn connection_url(&self) -> &str {
        &self.url
    }
}
