use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;

use crate::core::error::AppError;
use crate::features::auth::model::{AccessClaims, AuthenticatedUser};

/// Validates HS256 access tokens issued by [`TokenService`](super::services::TokenService)
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(access_token_secret: &str, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(access_token_secret.as_bytes()),
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("Access token rejected: {}", e);
                AppError::Unauthorized("Invalid or expired access token".to_string())
            })?;

        let claims = token_data.claims;
        Ok(AuthenticatedUser {
            user_id: claims.sub,
            role: claims.role,
            email: claims.email,
        })
    }
}
