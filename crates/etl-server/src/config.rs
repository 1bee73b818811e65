//! Configuration management

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::storage::config::StorageConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/etl";

/// Role assumed by statements issued on behalf of an end user.
pub const DEFAULT_DATABASE_USER_ROLE: &str = "authenticated";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default cap on a remote asset download (64 MiB).
pub const DEFAULT_ASSET_MAX_BYTES: u64 = 64 * 1024 * 1024;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
///
/// `url` carries the elevated (service) credential. End-user statements run on
/// the same pool but switch to `user_role` inside their transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub user_role: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Identity service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

/// How `POST /jobs/:id/run` hands work to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// Push onto the PostgreSQL-backed task queue
    #[default]
    Queue,
    /// Run the pipeline on a spawned task inside the API process
    Inline,
}

impl FromStr for QueueMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queue" => Ok(QueueMode::Queue),
            "inline" => Ok(QueueMode::Inline),
            other => anyhow::bail!("Invalid QUEUE_MODE '{}': expected 'queue' or 'inline'", other),
        }
    }
}

/// Task queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub url: String,
    pub mode: QueueMode,
    /// Run a queue consumer inside the API process
    pub worker_enabled: bool,
    /// Largest remote asset body the pipeline downloads
    pub max_asset_bytes: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Read every section from the process environment without validating it
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let mode = match std::env::var("QUEUE_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => QueueMode::default(),
        };

        Ok(Config {
            server: ServerConfig {
                host: std::env::var("ETL_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("ETL_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "ETL_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: database_url.clone(),
                user_role: std::env::var("DATABASE_USER_ROLE")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_USER_ROLE.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            auth: AuthConfig {
                url: std::env::var("AUTH_URL").ok().filter(|s| !s.trim().is_empty()),
                api_key: std::env::var("AUTH_API_KEY").ok().filter(|s| !s.trim().is_empty()),
            },
            storage: StorageConfig::from_env()?,
            queue: QueueConfig {
                url: std::env::var("QUEUE_URL").unwrap_or(database_url),
                mode,
                worker_enabled: env_or("WORKER_ENABLED", false),
                max_asset_bytes: env_or("ASSET_MAX_BYTES", DEFAULT_ASSET_MAX_BYTES),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.user_role.is_empty() {
            anyhow::bail!("DATABASE_USER_ROLE cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.queue.url.is_empty() {
            anyhow::bail!("Queue URL cannot be empty");
        }

        if self.queue.max_asset_bytes == 0 {
            anyhow::bail!("ASSET_MAX_BYTES must be greater than 0");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }

    /// Validate the settings only the HTTP server needs
    pub fn validate_for_server(&self) -> anyhow::Result<()> {
        self.validate()?;

        if self.auth.url.is_none() || self.auth.api_key.is_none() {
            anyhow::bail!("AUTH_URL and AUTH_API_KEY must be set to verify bearer tokens");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                user_role: DEFAULT_DATABASE_USER_ROLE.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            queue: QueueConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                mode: QueueMode::default(),
                worker_enabled: false,
                max_asset_bytes: DEFAULT_ASSET_MAX_BYTES,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.user_role, "authenticated");
        assert_eq!(config.queue.mode, QueueMode::Queue);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_validate_rejects_zero_asset_limit() {
        let mut config = Config::default();
        assert_eq!(config.queue.max_asset_bytes, 64 * 1024 * 1024);
        config.queue.max_asset_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let mut config = Config::default();
        config.database.min_connections = 20;
        config.database.max_connections = 5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_connections"));
    }

    #[test]
    fn test_server_requires_identity_settings() {
        let mut config = Config::default();
        assert!(config.validate_for_server().is_err());

        config.auth = AuthConfig {
            url: Some("http://localhost:54321".to_string()),
            api_key: Some("anon-key".to_string()),
        };
        assert!(config.validate_for_server().is_ok());
    }

    #[test]
    fn test_queue_mode_parsing() {
        assert_eq!("inline".parse::<QueueMode>().unwrap(), QueueMode::Inline);
        assert_eq!("QUEUE".parse::<QueueMode>().unwrap(), QueueMode::Queue);
        assert!("redis".parse::<QueueMode>().is_err());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = Config::default();
        config.auth.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
