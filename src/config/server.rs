use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to (e.g., "127.0.0.1")
    pub host: String,

    /// Port number to bind to (e.g., 5000)
    pub port: u16,

    /// Externally visible base URL, used to absolutize stored photo paths
    pub public_url: String,
}

impl ServerConfig {
    /// Validate server configuration values
    pub fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.public_url)
            .map_err(|e| format!("PUBLIC_URL is not a valid URL: {}", e))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err("PUBLIC_URL must use http or https".to_string());
        }

        Ok(())
    }
}
