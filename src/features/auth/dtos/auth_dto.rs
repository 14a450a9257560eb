use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::users::dtos::UserResponseDto;
use crate::shared::validation::{validate_password_strength, PHONE_REGEX, USERNAME_REGEX};

/// Request DTO for user registration. New accounts are always citizens.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3-50 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username must be lowercase letters, digits or underscores and not start with a digit"
        )
    )]
    pub username: String,

    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Phone number must be 10 digits"))]
    pub phone_number: Option<String>,
}

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    /// Email address or username
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub identifier: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for token refresh
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequestDto {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Response DTO for token refresh (same structure as auth response but without user info)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenResponseDto {
    /// New JWT access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token expiry time in seconds
    pub expires_in: i64,
    /// Rotated refresh token; the previous one is no longer accepted
    pub refresh_token: String,
}

/// Response DTO for authentication (register/login)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token expiry time in seconds
    pub expires_in: i64,
    pub refresh_token: String,
    pub user: UserResponseDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RegisterRequestDto {
        RegisterRequestDto {
            username: "jane_doe".to_string(),
            name: "Jane Doe".to_string(),
            email: "jane@example.test".to_string(),
            password: "Str0ng!pass".to_string(),
            phone_number: Some("0812345678".to_string()),
        }
    }

    #[test]
    fn test_register_dto_accepts_valid_input() {
        assert!(valid().validate().is_ok());
        let mut no_phone = valid();
        no_phone.phone_number = None;
        assert!(no_phone.validate().is_ok());
    }

    #[test]
    fn test_register_dto_rejects_weak_password_and_bad_fields() {
        let mut dto = valid();
        dto.password = "weakpass".to_string();
        assert!(dto.validate().is_err());

        let mut dto = valid();
        dto.email = "not-an-email".to_string();
        assert!(dto.validate().is_err());

        let mut dto = valid();
        dto.phone_number = Some("12345".to_string());
        assert!(dto.validate().is_err());

        let mut dto = valid();
        dto.username = "9lives".to_string();
        assert!(dto.validate().is_err());
    }
}
