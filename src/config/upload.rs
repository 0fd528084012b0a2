use serde::Deserialize;
use std::path::PathBuf;

/// Photo upload configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory photos are written to and served from under `/uploads`
    pub dir: PathBuf,

    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

impl UploadConfig {
    /// Validate upload configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.dir.as_os_str().is_empty() {
            return Err("UPLOAD_DIR cannot be empty".to_string());
        }

        if self.max_body_bytes < 1024 {
            return Err("MAX_BODY_BYTES must be at least 1024".to_string());
        }

        Ok(())
    }
}
