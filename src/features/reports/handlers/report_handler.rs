use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, MediaForm};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    AssignReportDto, AssignmentResponseDto, ChangeStatusDto, HistoryEntryResponseDto,
    ReportDraftDto, ReportResponseDto, ReportStatusFilter, ResolveReportForm, SubmitReportForm,
    UpdateAssignmentStatusDto,
};
use crate::features::reports::services::{LifecycleService, ReportService};
use crate::shared::types::{ApiResponse, PaginationQuery};

/// Shared state for report handlers
#[derive(Clone)]
pub struct ReportState {
    pub lifecycle: Arc<LifecycleService>,
    pub reports: Arc<ReportService>,
}

/// Submit a new report (citizen)
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body(content = SubmitReportForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Report submitted", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Missing or invalid fields, or unknown category"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only citizens can submit reports"),
        (status = 502, description = "Media upload failed")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn submit_report(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    mut form: MediaForm,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    let draft = ReportDraftDto {
        title: form.text(&["title"]),
        description: form.text(&["description"]),
        category_id: form.parse(&["categoryId", "category_id"])?,
        location_lat: form.parse(&["locationLat", "location_lat"])?,
        location_lng: form.parse(&["locationLng", "location_lng"])?,
        priority: form.parse(&["priority"])?,
    };
    let photo = form.take_file(&["photo"]);
    let voice = form.take_file(&["voiceRecording", "voice_recording"]);

    let report = state
        .lifecycle
        .submit_with_media(&user, draft, photo, voice)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(report),
            Some("Report submitted successfully".to_string()),
            None,
        )),
    ))
}

/// Reports filed by the caller, newest first
#[utoipa::path(
    get,
    path = "/api/reports/me",
    responses(
        (status = 200, description = "Caller's reports", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_reports(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let reports = state.reports.my_reports(&user).await?;
    Ok(Json(ApiResponse::success(Some(reports), None, None)))
}

/// All reports (admin), newest first
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportStatusFilter, PaginationQuery),
    responses(
        (status = 200, description = "Page of reports", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_reports(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Query(filter): Query<ReportStatusFilter>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let (reports, total) = state
        .reports
        .all_reports(&user, filter.status, &page)
        .await?;
    Ok(Json(ApiResponse::paginated(reports, total)))
}

/// Get a report by ID
#[utoipa::path(
    get,
    path = "/api/reports/{report_id}",
    params(
        ("report_id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report", body = ApiResponse<ReportResponseDto>),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_report(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = state.reports.get_report(&user, report_id).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

/// Status history of a report, oldest first
#[utoipa::path(
    get,
    path = "/api/reports/{report_id}/history",
    params(
        ("report_id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Ledger entries", body = ApiResponse<Vec<HistoryEntryResponseDto>>),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_report_history(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<HistoryEntryResponseDto>>>> {
    let history = state.reports.get_history(&user, report_id).await?;
    Ok(Json(ApiResponse::success(Some(history), None, None)))
}

/// Live (or most recent) assignment of a report
#[utoipa::path(
    get,
    path = "/api/reports/{report_id}/assignment",
    params(
        ("report_id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Assignment", body = ApiResponse<AssignmentResponseDto>),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Report or assignment not found")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_report_assignment(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssignmentResponseDto>>> {
    let assignment = state
        .reports
        .assignment_for_report(&user, report_id)
        .await?;
    Ok(Json(ApiResponse::success(Some(assignment), None, None)))
}

/// Assign a report to a department official (admin)
#[utoipa::path(
    post,
    path = "/api/admin/reports/{report_id}/assign",
    params(
        ("report_id" = Uuid, Path, description = "Report ID")
    ),
    request_body = AssignReportDto,
    responses(
        (status = 200, description = "Report assigned", body = ApiResponse<AssignmentResponseDto>),
        (status = 400, description = "Missing department or assignee, or report is closed"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Report, department or assignee not found"),
        (status = 409, description = "Report already has a live assignment, or was modified concurrently")
    ),
    tag = "admin-reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn assign_report(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Path(report_id): Path<Uuid>,
    AppJson(dto): AppJson<AssignReportDto>,
) -> Result<Json<ApiResponse<AssignmentResponseDto>>> {
    let assignment = state.lifecycle.assign(&user, report_id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(assignment),
        Some("Report assigned successfully".to_string()),
        None,
    )))
}

/// Change the status of a report (admin, scoped to the owning department)
#[utoipa::path(
    patch,
    path = "/api/admin/reports/{report_id}/status",
    params(
        ("report_id" = Uuid, Path, description = "Report ID")
    ),
    request_body = ChangeStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Missing status, same status, or transition not allowed"),
        (status = 403, description = "Not an admin of the owning department"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report was modified concurrently")
    ),
    tag = "admin-reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_report_status(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Path(report_id): Path<Uuid>,
    AppJson(dto): AppJson<ChangeStatusDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = state.lifecycle.change_status(&user, report_id, dto).await?;
    let message = format!("Report status updated to {}", report.status);
    Ok(Json(ApiResponse::success(Some(report), Some(message), None)))
}

/// Resolve a report with a completion photo (admin, scoped to the owning department)
#[utoipa::path(
    post,
    path = "/api/admin/reports/{report_id}/resolve",
    params(
        ("report_id" = Uuid, Path, description = "Report ID")
    ),
    request_body(content = ResolveReportForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Report resolved", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Completion photo missing or report already resolved"),
        (status = 403, description = "Not an admin of the owning department"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report was modified concurrently"),
        (status = 502, description = "Media upload failed")
    ),
    tag = "admin-reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn resolve_report(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Path(report_id): Path<Uuid>,
    mut form: MediaForm,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let photo = form.take_file(&["photo", "completionPhoto", "completion_photo"]);
    let remarks = form.text(&["remarks"]);

    let report = state
        .lifecycle
        .resolve_with_photo(&user, report_id, photo, remarks)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(report),
        Some("Report resolved successfully".to_string()),
        None,
    )))
}

/// Update the progress of an assignment (assignee only)
#[utoipa::path(
    patch,
    path = "/api/assignments/{assignment_id}/status",
    params(
        ("assignment_id" = Uuid, Path, description = "Assignment ID")
    ),
    request_body = UpdateAssignmentStatusDto,
    responses(
        (status = 200, description = "Assignment updated", body = ApiResponse<AssignmentResponseDto>),
        (status = 400, description = "Missing status, same status, or assignment completed"),
        (status = 403, description = "Caller is not the assignee"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Assignment was modified concurrently")
    ),
    tag = "reports",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_assignment_status(
    user: AuthenticatedUser,
    State(state): State<ReportState>,
    Path(assignment_id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAssignmentStatusDto>,
) -> Result<Json<ApiResponse<AssignmentResponseDto>>> {
    let assignment = state
        .lifecycle
        .update_assignment_status(&user, assignment_id, dto)
        .await?;
    let message = format!("Assignment status updated to {}", assignment.status);
    Ok(Json(ApiResponse::success(Some(assignment), Some(message), None)))
}
