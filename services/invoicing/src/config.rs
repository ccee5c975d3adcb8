//! Service configuration

use common::database::DatabaseConfig;
use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::jwt::JwtConfig;

/// Settings read once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub database_connection_timeout: u64,
    pub jwt_secret: String,
    pub jwt_access_token_expiry: u64,
    pub jwt_refresh_token_expiry: u64,
    pub skip_migrate: bool,
}

impl AppConfig {
    /// Build the configuration from environment variables
    ///
    /// # Environment Variables
    /// - `HOST`: Bind address (default: 0.0.0.0)
    /// - `PORT`: Listen port (default: 8080)
    /// - `DATABASE_URL`: PostgreSQL connection URL (required)
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DATABASE_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DATABASE_CONNECTION_TIMEOUT`: Pool acquire timeout in seconds (default: 30)
    /// - `JWT_SECRET`: Token signing secret (required)
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    /// - `SKIP_MIGRATE`: Do not run migrations on startup (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("database_max_connections", 10_i64)?
            .set_default("database_min_connections", 1_i64)?
            .set_default("database_connection_timeout", 30_i64)?
            .set_default("jwt_access_token_expiry", 900_i64)?
            .set_default("jwt_refresh_token_expiry", 604_800_i64)?
            .set_default("skip_migrate", false)?
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("JWT_SECRET must not be empty".to_string()));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connection_timeout: self.database_connection_timeout,
        }
    }

    pub fn jwt(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            access_token_expiry: self.jwt_access_token_expiry,
            refresh_token_expiry: self.jwt_refresh_token_expiry,
        }
    }
}
