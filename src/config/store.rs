use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Which document store backs the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// A single pretty-printed JSON file holding every document
    Json,
    /// PostgreSQL tables with one JSONB document per row
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "file" => Ok(StoreBackend::Json),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(format!("Unknown STORE_BACKEND: {}", other)),
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Path of the JSON data file (json backend)
    pub data_file: PathBuf,

    /// PostgreSQL connection URL (postgres backend)
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool
    pub max_connections: u32,

    /// Minimum number of database connections to maintain
    pub min_connections: u32,

    /// Timeout in seconds for acquiring a connection from the pool
    pub acquire_timeout_seconds: u64,
}

impl StoreConfig {
    /// Validate store configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == StoreBackend::Postgres && self.database_url.is_none() {
            return Err("DATABASE_URL is required when STORE_BACKEND=postgres".to_string());
        }

        if self.backend == StoreBackend::Json && self.data_file.as_os_str().is_empty() {
            return Err("DATA_FILE cannot be empty".to_string());
        }

        if self.min_connections > self.max_connections {
            return Err("DB_MIN_CONNECTIONS cannot be greater than DB_MAX_CONNECTIONS".to_string());
        }

        if self.acquire_timeout_seconds == 0 {
            return Err("DB_ACQUIRE_TIMEOUT_SECONDS must be greater than 0".to_string());
        }

        Ok(())
    }
}
