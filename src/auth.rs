use crate::error::{AppError, AppResult};
use crate::models::PublicUser;
use crate::util::null_as_default;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub exp: i64, // Expiration time as Unix timestamp
    pub iat: i64, // Issued at time as Unix timestamp
}

/// Registration request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub email: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub email: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response for both register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// JWT authentication service
#[derive(Clone)]
pub struct AuthService {
    secret: String,
    expiration_hours: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(secret: String, expiration_hours: i64) -> Self {
        Self {
            secret,
            expiration_hours,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor used for new password hashes
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user_id: &str, email: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.expiration_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Validate a JWT token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Token validation failed: {}", e);
            AppError::Unauthorized("Invalid token".to_string())
        })
    }

    /// Hash a plaintext password with the configured bcrypt cost
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Check a plaintext password against a stored bcrypt hash
    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        bcrypt::verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_and_validation() {
        let auth_service = AuthService::new("test_secret_key".to_string(), 24);

        let token = auth_service
            .generate_token("user-1", "cook@example.com")
            .expect("Failed to generate token");

        let claims = auth_service
            .validate_token(&token)
            .expect("Failed to validate token");

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "cook@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_invalid_token_validation() {
        let auth_service = AuthService::new("test_secret_key".to_string(), 24);

        let result = auth_service.validate_token("invalid_token");
        assert!(matches!(result, Err(AppError::Unauthorized(ref m)) if m == "Invalid token"));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = AuthService::new("first_secret".to_string(), 24);
        let verifier = AuthService::new("second_secret".to_string(), 24);

        let token = issuer.generate_token("user-1", "a@b.c").unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let auth_service = AuthService::new("test_secret_key".to_string(), 24).with_bcrypt_cost(4);
        let hash = auth_service.hash_password("hunter22").unwrap();
        assert!(auth_service.verify_password("hunter22", &hash).unwrap());
        assert!(!auth_service.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_register_request_requires_fields() {
        let request: RegisterRequest =
            serde_json::from_value(serde_json::json!({ "name": "Ann" })).unwrap();
        assert!(request.validate().is_err());
    }
}
