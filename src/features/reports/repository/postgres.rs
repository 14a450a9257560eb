use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    AssignmentStore, Contact, Directory, HistoryLedger, NotificationSink, ReportFilter,
    ReportStore, Transition, TransitionOutcome, UnitOfWork, CONCURRENT_UPDATE,
};
use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::notifications::models::Notification;
use crate::features::reports::models::{
    Assignment, AssignmentStatus, HistoryDraft, HistoryEntry, Report, ASSIGNMENT_COLUMNS,
    HISTORY_COLUMNS, REPORT_COLUMNS,
};

const NOTIFICATION_COLUMNS: &str = "id, user_id, report_id, message, status, created_at, updated_at";

/// Partial unique index allowing one non-completed assignment per report
const LIVE_ASSIGNMENT_INDEX: &str = "uq_report_assignments_live";

/// PostgreSQL implementation of every lifecycle store
pub struct PgLifecycleStore {
    pool: PgPool,
}

impl PgLifecycleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", action, e);
        AppError::Database(e)
    }
}

/// Append the next ledger entry for a report inside `tx`
async fn append_history(
    tx: &mut sqlx::PgConnection,
    report_id: Uuid,
    draft: &HistoryDraft,
) -> Result<HistoryEntry> {
    let sql = format!(
        r#"
        INSERT INTO report_history
            (id, report_id, seq, previous_status, new_status, changed_by, remarks)
        VALUES (
            $1, $2,
            (SELECT COALESCE(MAX(seq), 0) + 1 FROM report_history WHERE report_id = $2),
            $3, $4, $5, $6
        )
        RETURNING {}
        "#,
        HISTORY_COLUMNS
    );
    sqlx::query_as::<_, HistoryEntry>(&sql)
        .bind(Uuid::now_v7())
        .bind(report_id)
        .bind(draft.previous_status)
        .bind(draft.new_status)
        .bind(draft.changed_by)
        .bind(&draft.remarks)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("append report history"))
}

#[async_trait]
impl ReportStore for PgLifecycleStore {
    async fn find_report(&self, id: Uuid) -> Result<Option<Report>> {
        let sql = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);
        sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get report"))
    }

    async fn reports_by_submitter(&self, user_id: Uuid) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {} FROM reports WHERE user_id = $1 ORDER BY created_at DESC",
            REPORT_COLUMNS
        );
        sqlx::query_as::<_, Report>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list reports by submitter"))
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<(Vec<Report>, i64)> {
        let sql = format!(
            r#"
            SELECT {} FROM reports
            WHERE ($1::report_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            REPORT_COLUMNS
        );
        let reports = sqlx::query_as::<_, Report>(&sql)
            .bind(filter.status)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list reports"))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reports WHERE ($1::report_status IS NULL OR status = $1)",
        )
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count reports"))?;

        Ok((reports, total))
    }
}

#[async_trait]
impl AssignmentStore for PgLifecycleStore {
    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>> {
        let sql = format!(
            "SELECT {} FROM report_assignments WHERE id = $1",
            ASSIGNMENT_COLUMNS
        );
        sqlx::query_as::<_, Assignment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get assignment"))
    }

    async fn live_assignment(&self, report_id: Uuid) -> Result<Option<Assignment>> {
        let sql = format!(
            "SELECT {} FROM report_assignments WHERE report_id = $1 AND status <> 'completed'",
            ASSIGNMENT_COLUMNS
        );
        sqlx::query_as::<_, Assignment>(&sql)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get live assignment"))
    }

    async fn latest_assignment(&self, report_id: Uuid) -> Result<Option<Assignment>> {
        let sql = format!(
            r#"
            SELECT {} FROM report_assignments
            WHERE report_id = $1
            ORDER BY assigned_at DESC, id DESC
            LIMIT 1
            "#,
            ASSIGNMENT_COLUMNS
        );
        sqlx::query_as::<_, Assignment>(&sql)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get latest assignment"))
    }

    async fn is_assignee(&self, report_id: Uuid, user_id: Uuid) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM report_assignments WHERE report_id = $1 AND assigned_to = $2)",
        )
        .bind(report_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("check assignee"))
    }

    async fn update_assignment_status(
        &self,
        id: Uuid,
        expected: AssignmentStatus,
        new_status: AssignmentStatus,
    ) -> Result<Option<Assignment>> {
        let sql = format!(
            r#"
            UPDATE report_assignments
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        );
        sqlx::query_as::<_, Assignment>(&sql)
            .bind(id)
            .bind(expected)
            .bind(new_status)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("update assignment status"))
    }
}

#[async_trait]
impl HistoryLedger for PgLifecycleStore {
    async fn history_for_report(&self, report_id: Uuid) -> Result<Vec<HistoryEntry>> {
        let sql = format!(
            "SELECT {} FROM report_history WHERE report_id = $1 ORDER BY seq ASC",
            HISTORY_COLUMNS
        );
        sqlx::query_as::<_, HistoryEntry>(&sql)
            .bind(report_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("get report history"))
    }
}

#[async_trait]
impl NotificationSink for PgLifecycleStore {
    async fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list notifications"))
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient: Uuid,
    ) -> Result<Option<Notification>> {
        let sql = format!(
            r#"
            UPDATE notifications
            SET status = 'read', updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(recipient)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("mark notification as read"))
    }
}

#[async_trait]
impl Directory for PgLifecycleStore {
    async fn category_exists(&self, id: Uuid) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("check category"))
    }

    async fn department_exists(&self, id: Uuid) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM departments WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("check department"))
    }

    async fn administers_department(&self, user_id: Uuid, department_id: Uuid) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM departments WHERE id = $1 AND admin_user_id = $2)",
        )
        .bind(department_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("check department admin"))
    }

    async fn find_contact(&self, user_id: Uuid) -> Result<Option<Contact>> {
        let row: Option<(Uuid, String, String)> =
            sqlx::query_as("SELECT id, name, email FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("get user contact"))?;

        Ok(row.map(|(user_id, name, email)| Contact {
            user_id,
            name,
            email,
        }))
    }
}

#[async_trait]
impl UnitOfWork for PgLifecycleStore {
    async fn commit_submission(
        &self,
        report: &Report,
        history: HistoryDraft,
    ) -> Result<HistoryEntry> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin submission transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO reports (
                id, user_id, category_id, title, description, photo_url, voice_recording_url,
                location_lat, location_lng, status, priority, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(report.id)
        .bind(report.user_id)
        .bind(report.category_id)
        .bind(&report.title)
        .bind(&report.description)
        .bind(&report.photo_url)
        .bind(&report.voice_recording_url)
        .bind(report.location_lat)
        .bind(report.location_lng)
        .bind(report.status)
        .bind(report.priority)
        .bind(report.version)
        .bind(report.created_at)
        .bind(report.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("insert report"))?;

        let entry = append_history(&mut tx, report.id, &history).await?;

        tx.commit()
            .await
            .map_err(db_error("commit submission transaction"))?;

        Ok(entry)
    }

    async fn commit_transition(&self, transition: Transition) -> Result<TransitionOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transition transaction"))?;

        // Compare-and-swap on version: also takes the row lock for the rest of the tx
        let sql = format!(
            r#"
            UPDATE reports
            SET status = $3,
                version = version + 1,
                updated_at = NOW(),
                completion_photo_url = COALESCE($4, completion_photo_url),
                resolved_at = CASE WHEN $3 = 'resolved'::report_status THEN NOW() ELSE resolved_at END,
                resolved_by = CASE WHEN $3 = 'resolved'::report_status THEN $5 ELSE resolved_by END
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(transition.report_id)
            .bind(transition.expected_version)
            .bind(transition.history.new_status)
            .bind(&transition.completion_photo_url)
            .bind(transition.history.changed_by)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("update report status"))?
            .ok_or_else(|| AppError::Conflict(CONCURRENT_UPDATE.to_string()))?;

        if let Some(previous) = transition.supersede_assignment {
            sqlx::query(
                r#"
                UPDATE report_assignments
                SET status = 'completed', updated_at = NOW()
                WHERE id = $1 AND status <> 'completed'
                "#,
            )
            .bind(previous)
            .execute(&mut *tx)
            .await
            .map_err(db_error("supersede assignment"))?;
        }

        if let Some(assignment) = &transition.new_assignment {
            let sql = format!(
                "INSERT INTO report_assignments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                ASSIGNMENT_COLUMNS
            );
            sqlx::query(&sql)
                .bind(assignment.id)
                .bind(assignment.report_id)
                .bind(assignment.department_id)
                .bind(assignment.assigned_to)
                .bind(assignment.assigned_by)
                .bind(assignment.status)
                .bind(&assignment.remarks)
                .bind(assignment.assigned_at)
                .bind(assignment.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e, Some(LIVE_ASSIGNMENT_INDEX)) {
                        AppError::Conflict("Report already has a live assignment".to_string())
                    } else {
                        tracing::error!("Failed to insert assignment: {:?}", e);
                        AppError::Database(e)
                    }
                })?;
        }

        let history = append_history(&mut tx, transition.report_id, &transition.history).await?;

        if let Some(notification) = &transition.notification {
            let sql = format!(
                "INSERT INTO notifications ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
                NOTIFICATION_COLUMNS
            );
            sqlx::query(&sql)
                .bind(notification.id)
                .bind(notification.user_id)
                .bind(notification.report_id)
                .bind(&notification.message)
                .bind(notification.status)
                .bind(notification.created_at)
                .bind(notification.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(db_error("insert notification"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("commit transition transaction"))?;

        Ok(TransitionOutcome { report, history })
    }
}
