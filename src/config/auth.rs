use serde::Deserialize;

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT secret key for token signing and validation
    pub jwt_secret: String,

    /// JWT token expiration time in hours
    pub jwt_expiration_hours: i64,

    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Validate authentication configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters for security".to_string());
        }

        if self.jwt_expiration_hours < 1 {
            return Err("JWT_EXPIRATION_HOURS must be at least 1".to_string());
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err("BCRYPT_COST must be between 4 and 31".to_string());
        }

        Ok(())
    }
}
