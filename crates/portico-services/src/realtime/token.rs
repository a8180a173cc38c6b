//! Channel access tokens.
//!
//! A token is fetched fresh per subscription attempt, bound to the caller's
//! user id, and expires after the configured TTL (one hour by default).
//! There is no renewal: a session older than the TTL stops receiving events
//! until the caller runs a new subscription cycle.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use portico_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelClaims {
    /// Subscribing user id.
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedChannelToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ChannelTokenService {
    secret: String,
    ttl_secs: u64,
}

impl ChannelTokenService {
    pub fn new(secret: String, ttl_secs: u64) -> Self {
        ChannelTokenService { secret, ttl_secs }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<IssuedChannelToken, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.ttl_secs as i64);
        let claims = ChannelClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign channel token: {}", e)))?;
        Ok(IssuedChannelToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<ChannelClaims, AppError> {
        let data = decode::<ChannelClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized(format!("Invalid channel token: {}", e)))?;
        Ok(data.claims)
    }
}
