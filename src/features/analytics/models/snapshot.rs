use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Point-in-time derived metrics over all reports
#[derive(Debug, Clone, FromRow)]
pub struct AnalyticsSnapshot {
    pub id: Uuid,
    pub report_count: i64,
    pub resolved_count: i64,
    /// Mean of (resolved_at - created_at) in days over resolved reports; 0 when none
    pub avg_resolution_days: f64,
    pub generated_at: DateTime<Utc>,
}
