use serde::Deserialize;

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Raw comma-separated origin patterns ("*" allows every origin)
    pub origins: String,
}
