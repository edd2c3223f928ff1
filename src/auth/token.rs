use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::AuthUser;
use crate::config::SecurityConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, expiry_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            exp: (now + Duration::hours(expiry_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Reasons a presented token is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("Invalid or expired token")]
    Invalid,
    #[error("Invalid user_id in token")]
    MissingUserId,
}

/// Issues and verifies HS256 tokens with a single symmetric secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry_hours: i64,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: i64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }

        // Any HMAC algorithm is accepted on the way in; RSA/EC or "none" are not.
        // `exp` stays mandatory: a token without one is refused.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_hours,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    pub fn issue(&self, user_id: i64) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, self.expiry_hours);
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify signature and expiry, then pull the numeric `user_id` claim.
    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenRejection> {
        let data = decode::<Map<String, Value>>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::warn!(error = %e, "Invalid or expired token");
            TokenRejection::Invalid
        })?;

        match data.claims.get("user_id").and_then(claim_as_i64) {
            Some(user_id) => Ok(AuthUser::new(user_id)),
            None => {
                tracing::error!(claims = ?data.claims, "user_id missing or invalid in token");
                Err(TokenRejection::MissingUserId)
            }
        }
    }
}

/// JSON numbers may arrive as `5` or `5.0`; anything with a fraction is not an id.
fn claim_as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}
