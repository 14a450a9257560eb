use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    AuthResponseDto, LoginRequestDto, RefreshTokenRequestDto, RefreshTokenResponseDto,
    RegisterRequestDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::password::{hash_password, verify_password};
use crate::features::auth::services::token_service::TokenService;
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::models::{CreateUser, User, UserRole};
use crate::features::users::UserService;

/// Service for authentication operations (register, login, refresh, logout)
pub struct AuthService {
    users: Arc<UserService>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<UserService>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Register a new citizen account and sign it in
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        let password_hash = hash_password(&dto.password)?;

        let user = self
            .users
            .create(CreateUser {
                username: dto.username.trim().to_lowercase(),
                name: dto.name.trim().to_string(),
                email: dto.email.trim().to_lowercase(),
                password_hash,
                role: UserRole::Citizen,
                phone_number: dto.phone_number,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.sign_in(user).await
    }

    /// Login with email or username and password
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let user = self
            .users
            .find_by_login(&dto.identifier)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(&dto.password, &user.password_hash) {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        self.sign_in(user).await
    }

    /// Get current user info (for /me endpoint)
    pub async fn get_current_user(&self, user: &AuthenticatedUser) -> Result<UserResponseDto> {
        Ok(self.users.find_by_id(user.user_id).await?.into())
    }

    /// Exchange a refresh token for a new pair; the presented token is retired
    pub async fn refresh_token(
        &self,
        dto: RefreshTokenRequestDto,
    ) -> Result<RefreshTokenResponseDto> {
        let claims = self.tokens.verify_refresh(&dto.refresh_token)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::Unauthorized("Invalid or expired refresh token".to_string())
                }
                other => other,
            })?;

        let presented = TokenService::fingerprint(&dto.refresh_token);
        if user.refresh_token_hash.as_deref() != Some(presented.as_str()) {
            return Err(AppError::Unauthorized(
                "Refresh token has been revoked or rotated".to_string(),
            ));
        }

        let tokens = self.tokens.issue(&user)?;
        self.users
            .set_refresh_token_hash(user.id, Some(&TokenService::fingerprint(&tokens.refresh_token)))
            .await?;

        Ok(RefreshTokenResponseDto {
            access_token: tokens.access_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Revoke the caller's refresh token
    pub async fn logout(&self, user: &AuthenticatedUser) -> Result<()> {
        self.users.set_refresh_token_hash(user.user_id, None).await
    }

    async fn sign_in(&self, user: User) -> Result<AuthResponseDto> {
        let tokens = self.tokens.issue(&user)?;
        self.users
            .set_refresh_token_hash(user.id, Some(&TokenService::fingerprint(&tokens.refresh_token)))
            .await?;

        Ok(AuthResponseDto {
            access_token: tokens.access_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in,
            refresh_token: tokens.refresh_token,
            user: user.into(),
        })
    }
}
