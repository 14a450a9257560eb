use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AccessClaims, RefreshClaims};
use crate::features::users::models::User;

/// Freshly issued access/refresh token pair
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Issues and verifies locally signed HS256 tokens
pub struct TokenService {
    config: AuthConfig,
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            access_key: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(
                config.refresh_token_secret.as_bytes(),
            ),
            config,
        }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedTokens> {
        let now = Utc::now().timestamp();
        let access_ttl = self.config.access_token_ttl.as_secs() as i64;
        let refresh_ttl = self.config.refresh_token_ttl.as_secs() as i64;

        let access_claims = AccessClaims {
            sub: user.id,
            role: user.role,
            email: user.email.clone(),
            iat: now,
            exp: now + access_ttl,
        };
        let refresh_claims = RefreshClaims {
            sub: user.id,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + refresh_ttl,
        };

        let access_token = encode(&Header::default(), &access_claims, &self.access_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.refresh_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign refresh token: {}", e)))?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_in: access_ttl,
        })
    }

    /// Verify a refresh token's signature and expiry
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.config.jwt_leeway.as_secs();

        decode::<RefreshClaims>(token, &self.refresh_decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Refresh token rejected: {}", e);
                AppError::Unauthorized("Invalid or expired refresh token".to_string())
            })
    }

    /// SHA-256 hex fingerprint stored in place of the raw refresh token
    pub fn fingerprint(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
