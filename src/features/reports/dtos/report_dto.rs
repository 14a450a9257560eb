use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::reports::models::{
    Assignment, AssignmentStatus, HistoryEntry, Report, ReportPriority, ReportStatus,
};

/// Report fields supplied by a citizen, before any media is attached.
///
/// Every field is optional on the wire so missing ones surface as
/// validation errors with a precise message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReportDraftDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub priority: Option<ReportPriority>,
}

/// Multipart form accepted by the submit endpoint (documentation only)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct SubmitReportForm {
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub location_lat: f64,
    pub location_lng: f64,
    pub priority: Option<ReportPriority>,
    #[schema(value_type = String, format = Binary)]
    pub photo: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub voice_recording: Option<Vec<u8>>,
}

/// Multipart form accepted by the resolve endpoint (documentation only)
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct ResolveReportForm {
    #[schema(value_type = String, format = Binary)]
    pub photo: Vec<u8>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub photo_url: String,
    pub voice_recording_url: Option<String>,
    pub completion_photo_url: Option<String>,
    pub location_lat: f64,
    pub location_lng: f64,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            category_id: r.category_id,
            title: r.title,
            description: r.description,
            photo_url: r.photo_url,
            voice_recording_url: r.voice_recording_url,
            completion_photo_url: r.completion_photo_url,
            location_lat: r.location_lat,
            location_lng: r.location_lng,
            status: r.status,
            priority: r.priority,
            resolved_at: r.resolved_at,
            resolved_by: r.resolved_by,
            version: r.version,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignReportDto {
    pub department_id: Option<Uuid>,
    pub assigned_to_user_id: Option<Uuid>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeStatusDto {
    pub new_status: Option<ReportStatus>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateAssignmentStatusDto {
    pub new_status: Option<AssignmentStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResponseDto {
    pub id: Uuid,
    pub report_id: Uuid,
    pub department_id: Uuid,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub status: AssignmentStatus,
    pub remarks: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Assignment> for AssignmentResponseDto {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id,
            report_id: a.report_id,
            department_id: a.department_id,
            assigned_to: a.assigned_to,
            assigned_by: a.assigned_by,
            status: a.status,
            remarks: a.remarks,
            assigned_at: a.assigned_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntryResponseDto {
    pub id: Uuid,
    pub report_id: Uuid,
    pub seq: i32,
    pub previous_status: Option<ReportStatus>,
    pub new_status: ReportStatus,
    pub changed_by: Uuid,
    pub remarks: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryEntryResponseDto {
    fn from(h: HistoryEntry) -> Self {
        Self {
            id: h.id,
            report_id: h.report_id,
            seq: h.seq,
            previous_status: h.previous_status,
            new_status: h.new_status,
            changed_by: h.changed_by,
            remarks: h.remarks,
            changed_at: h.changed_at,
        }
    }
}

/// Status filter for the admin report listing, combined with `PaginationQuery`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportStatusFilter {
    /// Only reports currently in this status
    pub status: Option<ReportStatus>,
}
