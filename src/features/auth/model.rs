use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::users::models::UserRole;

/// Caller identity resolved from a validated access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
    pub email: String,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    /// Check if user is super admin
    pub fn is_super_admin(&self) -> bool {
        self.has_role(UserRole::SuperAdmin)
    }

    /// Department admin or super admin
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub role: UserRole,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token (signed with a separate secret)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    /// Unique token id so two tokens issued in the same second never collide
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}
