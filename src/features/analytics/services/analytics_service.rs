use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::analytics::dtos::AnalyticsSnapshotDto;
use crate::features::analytics::models::AnalyticsSnapshot;

const SNAPSHOT_COLUMNS: &str =
    "id, report_count, resolved_count, avg_resolution_days, generated_at";

pub struct AnalyticsService {
    pool: PgPool,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Recompute metrics over all reports and store them as a new snapshot
    pub async fn generate(&self) -> Result<AnalyticsSnapshotDto> {
        let sql = format!(
            r#"
            WITH stats AS (
                SELECT
                    COUNT(*) AS report_count,
                    COUNT(*) FILTER (WHERE status = 'resolved') AS resolved_count,
                    COALESCE(
                        AVG(EXTRACT(EPOCH FROM (resolved_at - created_at)) / 86400.0)
                            FILTER (WHERE status = 'resolved' AND resolved_at IS NOT NULL),
                        0
                    )::DOUBLE PRECISION AS avg_resolution_days
                FROM reports
            )
            INSERT INTO analytics_snapshots (id, report_count, resolved_count, avg_resolution_days)
            SELECT $1, report_count, resolved_count, avg_resolution_days FROM stats
            RETURNING {}
            "#,
            SNAPSHOT_COLUMNS
        );

        let snapshot = sqlx::query_as::<_, AnalyticsSnapshot>(&sql)
            .bind(Uuid::now_v7())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to generate analytics snapshot: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!(
            report_count = snapshot.report_count,
            resolved_count = snapshot.resolved_count,
            avg_resolution_days = snapshot.avg_resolution_days,
            "Analytics snapshot generated"
        );

        Ok(snapshot.into())
    }

    /// Most recent snapshot
    pub async fn latest(&self) -> Result<AnalyticsSnapshotDto> {
        let sql = format!(
            "SELECT {} FROM analytics_snapshots ORDER BY generated_at DESC LIMIT 1",
            SNAPSHOT_COLUMNS
        );

        sqlx::query_as::<_, AnalyticsSnapshot>(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get latest analytics snapshot: {:?}", e);
                AppError::Database(e)
            })?
            .map(Into::into)
            .ok_or_else(|| {
                AppError::NotFound(
                    "No dashboard data found. Analytics may not have been run yet.".to_string(),
                )
            })
    }
}
