use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for department
#[derive(Debug, Clone, FromRow)]
pub struct Department {
    pub id: Uuid,
    /// The department_admin who owns reports assigned to this department
    pub admin_user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
