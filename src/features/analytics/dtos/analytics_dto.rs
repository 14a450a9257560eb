use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::analytics::models::AnalyticsSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSnapshotDto {
    pub id: Uuid,
    pub report_count: i64,
    pub resolved_count: i64,
    /// Share of reports that are resolved, 0.0 to 1.0
    pub resolution_rate: f64,
    pub avg_resolution_days: f64,
    pub generated_at: DateTime<Utc>,
}

impl From<AnalyticsSnapshot> for AnalyticsSnapshotDto {
    fn from(s: AnalyticsSnapshot) -> Self {
        let resolution_rate = if s.report_count > 0 {
            s.resolved_count as f64 / s.report_count as f64
        } else {
            0.0
        };

        Self {
            id: s.id,
            report_count: s.report_count,
            resolved_count: s.resolved_count,
            resolution_rate,
            avg_resolution_days: s.avg_resolution_days,
            generated_at: s.generated_at,
        }
    }
}
