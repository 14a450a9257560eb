use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::departments::models::Department;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepartmentResponseDto {
    pub id: Uuid,
    pub admin_user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Department> for DepartmentResponseDto {
    fn from(d: Department) -> Self {
        Self {
            id: d.id,
            admin_user_id: d.admin_user_id,
            name: d.name,
            description: d.description,
            contact_info: d.contact_info,
            created_at: d.created_at,
        }
    }
}

/// Request DTO for creating a department
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentDto {
    #[validate(length(min = 1, max = 100, message = "Department name is required"))]
    pub name: String,

    /// User who administers the department
    pub admin_user_id: Option<Uuid>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Contact info must be at most 200 characters"))]
    pub contact_info: Option<String>,
}
