mod auth;
mod cors;
mod rate_limit;
mod server;
mod store;
mod upload;

pub use auth::AuthConfig;
pub use cors::CorsConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use store::{StoreBackend, StoreConfig};
pub use upload::UploadConfig;

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// Read `key` through `lookup`, falling back to `default`, and parse it.
fn parse_var<T, F>(lookup: &F, key: &str, default: &str) -> AppResult<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", key)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_var(&lookup, "PORT", "5000")?;
        let public_url = lookup("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        let backend = lookup("STORE_BACKEND")
            .unwrap_or_else(|| "json".to_string())
            .parse::<StoreBackend>()
            .map_err(AppError::Configuration)?;
        let data_file =
            PathBuf::from(lookup("DATA_FILE").unwrap_or_else(|| "data/db.json".to_string()));
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let max_connections = parse_var(&lookup, "DB_MAX_CONNECTIONS", "10")?;
        let min_connections = parse_var(&lookup, "DB_MIN_CONNECTIONS", "1")?;
        let acquire_timeout_seconds = parse_var(&lookup, "DB_ACQUIRE_TIMEOUT_SECONDS", "30")?;

        // Authentication config
        let jwt_secret =
            lookup("JWT_SECRET").ok_or_else(|| AppError::MissingEnvVar("JWT_SECRET".to_string()))?;
        let jwt_expiration_hours = parse_var(&lookup, "JWT_EXPIRATION_HOURS", "168")?;
        let bcrypt_cost = parse_var(&lookup, "BCRYPT_COST", "12")?;

        let upload_dir =
            PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()));
        let max_body_bytes = parse_var(&lookup, "MAX_BODY_BYTES", "10485760")?;

        // Rate limit config
        let requests_per_minute = parse_var(&lookup, "RATE_LIMIT_PER_MINUTE", "30")?;
        let burst_size = parse_var(&lookup, "RATE_LIMIT_BURST", "10")?;

        // CORS patterns are compiled later by the origin matcher
        let origins = lookup("CORS_ORIGIN").unwrap_or_else(|| "*".to_string());

        let config = Config {
            server: ServerConfig {
                host,
                port,
                public_url,
            },
            store: StoreConfig {
                backend,
                data_file,
                database_url,
                max_connections,
                min_connections,
                acquire_timeout_seconds,
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_expiration_hours,
                bcrypt_cost,
            },
            upload: UploadConfig {
                dir: upload_dir,
                max_body_bytes,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute,
                burst_size,
            },
            cors: CorsConfig { origins },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate every configuration section
    pub fn validate(&self) -> AppResult<()> {
        self.server
            .validate()
            .and_then(|_| self.store.validate())
            .and_then(|_| self.auth.validate())
            .and_then(|_| self.upload.validate())
            .and_then(|_| self.rate_limit.validate())
            .map_err(AppError::Configuration)
    }
}
