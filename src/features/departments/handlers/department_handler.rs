use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSuperAdmin;
use crate::features::departments::dtos::{CreateDepartmentDto, DepartmentResponseDto};
use crate::features::departments::services::DepartmentService;
use crate::shared::types::ApiResponse;

/// List all departments
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "List of departments", body = ApiResponse<Vec<DepartmentResponseDto>>),
    ),
    tag = "departments"
)]
pub async fn list_departments(
    State(service): State<Arc<DepartmentService>>,
) -> Result<Json<ApiResponse<Vec<DepartmentResponseDto>>>> {
    let departments = service.list().await?;
    Ok(Json(ApiResponse::success(Some(departments), None, None)))
}

/// Create a department (super admin only)
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentDto,
    responses(
        (status = 201, description = "Department created", body = ApiResponse<DepartmentResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Super admin access required"),
        (status = 404, description = "Admin user not found"),
        (status = 409, description = "Department already exists")
    ),
    tag = "departments",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_department(
    RequireSuperAdmin(_user): RequireSuperAdmin,
    State(service): State<Arc<DepartmentService>>,
    AppJson(dto): AppJson<CreateDepartmentDto>,
) -> Result<(StatusCode, Json<ApiResponse<DepartmentResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let department = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(department),
            Some("Department created successfully".to_string()),
            None,
        )),
    ))
}
