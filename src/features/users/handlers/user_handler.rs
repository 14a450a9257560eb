use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSuperAdmin;
use crate::features::users::dtos::{UpdateUserRoleDto, UserResponseDto};
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, PaginationQuery};

/// List all users (super admin only)
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Super admin access required")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    RequireSuperAdmin(_user): RequireSuperAdmin,
    State(service): State<Arc<UserService>>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let (users, total) = service.list(&page).await?;
    Ok(Json(ApiResponse::paginated(users, total)))
}

/// Change another user's role (super admin only)
#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}/role",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRoleDto,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Cannot change own role"),
        (status = 403, description = "Forbidden - Super admin access required"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user_role(
    RequireSuperAdmin(user): RequireSuperAdmin,
    State(service): State<Arc<UserService>>,
    Path(user_id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateUserRoleDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let updated = service.update_role(user.user_id, user_id, dto.role).await?;
    Ok(Json(ApiResponse::success(
        Some(updated),
        Some("User role updated successfully".to_string()),
        None,
    )))
}
