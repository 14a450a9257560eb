use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Completed,
}

impl AssignmentStatus {
    /// A live assignment is any that is not completed
    pub fn is_live(&self) -> bool {
        !matches!(self, AssignmentStatus::Completed)
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentStatus::Assigned => write!(f, "assigned"),
            AssignmentStatus::InProgress => write!(f, "in_progress"),
            AssignmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Delegation of a report to a department official
#[derive(Debug, Clone, FromRow)]
pub struct Assignment {
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

pub(crate) const ASSIGNMENT_COLUMNS: &str =
    "id, report_id, department_id, assigned_to, assigned_by, status, remarks, assigned_at, updated_at";
