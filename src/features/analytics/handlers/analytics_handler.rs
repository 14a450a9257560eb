use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::features::analytics::dtos::AnalyticsSnapshotDto;
use crate::features::analytics::services::AnalyticsService;
use crate::features::auth::guards::RequireAdmin;
use crate::shared::types::ApiResponse;

/// Latest analytics snapshot (admin)
#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    responses(
        (status = 200, description = "Latest snapshot", body = ApiResponse<AnalyticsSnapshotDto>),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Analytics not generated yet")
    ),
    tag = "analytics",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_dashboard_summary(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AnalyticsService>>,
) -> Result<Json<ApiResponse<AnalyticsSnapshotDto>>> {
    let snapshot = service.latest().await?;
    Ok(Json(ApiResponse::success(Some(snapshot), None, None)))
}

/// Recompute and store a new analytics snapshot (admin)
#[utoipa::path(
    post,
    path = "/api/analytics/generate",
    responses(
        (status = 200, description = "Snapshot generated", body = ApiResponse<AnalyticsSnapshotDto>),
        (status = 403, description = "Admin access required")
    ),
    tag = "analytics",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_analytics(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<AnalyticsService>>,
) -> Result<Json<ApiResponse<AnalyticsSnapshotDto>>> {
    tracing::info!(actor = %user.user_id, "Analytics generation requested");
    let snapshot = service.generate().await?;
    Ok(Json(ApiResponse::success(
        Some(snapshot),
        Some("Analytics generated and stored successfully".to_string()),
        None,
    )))
}
