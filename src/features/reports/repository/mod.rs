//! Storage seams of the report lifecycle.
//!
//! Each store is its own trait so read paths depend only on what they use.
//! Writes that change a report's status go exclusively through [`UnitOfWork`],
//! which applies the report update, ledger append, assignment changes and
//! notification as one atomic commit guarded by the report's `version`.

mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgLifecycleStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::notifications::models::Notification;
use crate::features::reports::models::{
    Assignment, AssignmentStatus, HistoryDraft, HistoryEntry, Report, ReportStatus,
};

/// Filter for the admin report listing
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn find_report(&self, id: Uuid) -> Result<Option<Report>>;

    /// Reports filed by `user_id`, newest first
    async fn reports_by_submitter(&self, user_id: Uuid) -> Result<Vec<Report>>;

    /// One page of reports, newest first, with the unpaged total
    async fn list_reports(&self, filter: &ReportFilter) -> Result<(Vec<Report>, i64)>;
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>>;

    /// The report's assignment that is not completed, if any
    async fn live_assignment(&self, report_id: Uuid) -> Result<Option<Assignment>>;

    /// Most recent assignment regardless of status
    async fn latest_assignment(&self, report_id: Uuid) -> Result<Option<Assignment>>;

    async fn is_assignee(&self, report_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Set the status only if it still equals `expected`. `None` when it did not.
    async fn update_assignment_status(
        &self,
        id: Uuid,
        expected: AssignmentStatus,
        new_status: AssignmentStatus,
    ) -> Result<Option<Assignment>>;
}

#[async_trait]
pub trait HistoryLedger: Send + Sync {
    /// Entries in ledger order (oldest first)
    async fn history_for_report(&self, report_id: Uuid) -> Result<Vec<HistoryEntry>>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Newest first
    async fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>>;

    /// Flip to read if `recipient` owns it. `None` when no such notification for them.
    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient: Uuid,
    ) -> Result<Option<Notification>>;
}

/// E-mail address and display name of a user
#[derive(Debug, Clone)]
pub struct Contact {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Lookups into identity data the lifecycle references by id
#[async_trait]
pub trait Directory: Send + Sync {
    async fn category_exists(&self, id: Uuid) -> Result<bool>;

    async fn department_exists(&self, id: Uuid) -> Result<bool>;

    /// Whether `user_id` is the admin of `department_id`
    async fn administers_department(&self, user_id: Uuid, department_id: Uuid) -> Result<bool>;

    async fn find_contact(&self, user_id: Uuid) -> Result<Option<Contact>>;
}

/// A status change and everything that must land with it
#[derive(Debug, Clone)]
pub struct Transition {
    pub report_id: Uuid,
    /// Version read by the caller; the commit fails with `Conflict` if it moved
    pub expected_version: i64,
    pub history: HistoryDraft,
    /// Stored alongside a move to `resolved`
    pub completion_photo_url: Option<String>,
    /// Live assignment to mark completed before `new_assignment` is inserted
    pub supersede_assignment: Option<Uuid>,
    pub new_assignment: Option<Assignment>,
    pub notification: Option<Notification>,
}

/// State after a committed transition
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub report: Report,
    pub history: HistoryEntry,
}

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Insert a new report together with its initial ledger entry
    async fn commit_submission(&self, report: &Report, history: HistoryDraft)
        -> Result<HistoryEntry>;

    /// Apply a transition atomically, or nothing at all
    async fn commit_transition(&self, transition: Transition) -> Result<TransitionOutcome>;
}

/// Everything the lifecycle engine needs from storage
pub trait LifecycleRepository:
    ReportStore + AssignmentStore + HistoryLedger + NotificationSink + Directory + UnitOfWork
{
}

impl<T> LifecycleRepository for T where
    T: ReportStore + AssignmentStore + HistoryLedger + NotificationSink + Directory + UnitOfWork
{
}

/// Message for a lost compare-and-swap
pub(crate) const CONCURRENT_UPDATE: &str =
    "Report was modified by another request, reload and try again";
