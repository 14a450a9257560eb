//! In-memory lifecycle store for tests.
//!
//! Commits are staged on a copy of the state and swapped in only when every
//! step succeeded, so an injected failure leaves nothing behind.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Barrier, RwLock};
use uuid::Uuid;

use super::{
    AssignmentStore, Contact, Directory, HistoryLedger, NotificationSink, ReportFilter,
    ReportStore, Transition, TransitionOutcome, UnitOfWork, CONCURRENT_UPDATE,
};
use crate::core::error::{AppError, Result};
use crate::features::notifications::models::{Notification, NotificationStatus};
use crate::features::reports::models::{
    Assignment, AssignmentStatus, HistoryDraft, HistoryEntry, Report, ReportStatus,
};

#[derive(Debug, Clone, Default)]
struct State {
    reports: HashMap<Uuid, Report>,
    assignments: Vec<Assignment>,
    history: Vec<HistoryEntry>,
    notifications: Vec<Notification>,
    categories: HashSet<Uuid>,
    /// department id -> admin user id
    departments: HashMap<Uuid, Option<Uuid>>,
    contacts: HashMap<Uuid, Contact>,
}

impl State {
    fn append_history(&mut self, report_id: Uuid, draft: HistoryDraft) -> HistoryEntry {
        let seq = self
            .history
            .iter()
            .filter(|h| h.report_id == report_id)
            .map(|h| h.seq)
            .max()
            .unwrap_or(0)
            + 1;
        let entry = draft.into_entry(report_id, seq);
        self.history.push(entry.clone());
        entry
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_next_commit: AtomicBool,
    read_barrier: Option<Arc<Barrier>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `find_report` waits on `barrier` after reading, so callers that
    /// read the same version can be released together
    pub fn with_read_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.read_barrier = Some(barrier);
        self
    }

    /// Make the next commit fail after all of its writes were staged
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub async fn add_category(&self) -> Uuid {
        let id = Uuid::now_v7();
        self.state.write().await.categories.insert(id);
        id
    }

    pub async fn add_department(&self, admin_user_id: Option<Uuid>) -> Uuid {
        let id = Uuid::now_v7();
        self.state.write().await.departments.insert(id, admin_user_id);
        id
    }

    pub async fn add_contact(&self, user_id: Uuid, name: &str, email: &str) {
        self.state.write().await.contacts.insert(
            user_id,
            Contact {
                user_id,
                name: name.to_string(),
                email: email.to_string(),
            },
        );
    }

    pub async fn add_notification(&self, user_id: Uuid, message: &str) -> Uuid {
        let notification = Notification::unread(user_id, Uuid::now_v7(), message.to_string());
        let id = notification.id;
        self.state.write().await.notifications.push(notification);
        id
    }

    pub async fn report(&self, id: Uuid) -> Option<Report> {
        self.state.read().await.reports.get(&id).cloned()
    }

    pub async fn report_count(&self) -> usize {
        self.state.read().await.reports.len()
    }

    pub async fn history(&self, report_id: Uuid) -> Vec<HistoryEntry> {
        let mut entries: Vec<_> = self
            .state
            .read()
            .await
            .history
            .iter()
            .filter(|h| h.report_id == report_id)
            .cloned()
            .collect();
        entries.sort_by_key(|h| h.seq);
        entries
    }

    pub async fn assignments(&self, report_id: Uuid) -> Vec<Assignment> {
        self.state
            .read()
            .await
            .assignments
            .iter()
            .filter(|a| a.report_id == report_id)
            .cloned()
            .collect()
    }

    pub async fn all_notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }

    fn take_injected_failure(&self) -> Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(AppError::Internal("injected commit failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn find_report(&self, id: Uuid) -> Result<Option<Report>> {
        let report = self.state.read().await.reports.get(&id).cloned();
        if let Some(barrier) = &self.read_barrier {
            barrier.wait().await;
        }
        Ok(report)
    }

    async fn reports_by_submitter(&self, user_id: Uuid) -> Result<Vec<Report>> {
        let mut reports: Vec<_> = self
            .state
            .read()
            .await
            .reports
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<(Vec<Report>, i64)> {
        let mut reports: Vec<_> = self
            .state
            .read()
            .await
            .reports
            .values()
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = reports.len() as i64;
        let page = reports
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn find_assignment(&self, id: Uuid) -> Result<Option<Assignment>> {
        let state = self.state.read().await;
        Ok(state.assignments.iter().find(|a| a.id == id).cloned())
    }

    async fn live_assignment(&self, report_id: Uuid) -> Result<Option<Assignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .find(|a| a.report_id == report_id && a.status.is_live())
            .cloned())
    }

    async fn latest_assignment(&self, report_id: Uuid) -> Result<Option<Assignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|a| a.report_id == report_id)
            .max_by_key(|a| (a.assigned_at, a.id))
            .cloned())
    }

    async fn is_assignee(&self, report_id: Uuid, user_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .any(|a| a.report_id == report_id && a.assigned_to == user_id))
    }

    async fn update_assignment_status(
        &self,
        id: Uuid,
        expected: AssignmentStatus,
        new_status: AssignmentStatus,
    ) -> Result<Option<Assignment>> {
        let mut state = self.state.write().await;
        let Some(assignment) = state
            .assignments
            .iter_mut()
            .find(|a| a.id == id && a.status == expected)
        else {
            return Ok(None);
        };
        assignment.status = new_status;
        assignment.updated_at = Utc::now();
        Ok(Some(assignment.clone()))
    }
}

#[async_trait]
impl HistoryLedger for MemoryStore {
    async fn history_for_report(&self, report_id: Uuid) -> Result<Vec<HistoryEntry>> {
        Ok(self.history(report_id).await)
    }
}

#[async_trait]
impl NotificationSink for MemoryStore {
    async fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let mut notifications: Vec<_> = self
            .state
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient: Uuid,
    ) -> Result<Option<Notification>> {
        let mut state = self.state.write().await;
        let Some(notification) = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == recipient)
        else {
            return Ok(None);
        };
        notification.status = NotificationStatus::Read;
        notification.updated_at = Utc::now();
        Ok(Some(notification.clone()))
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn category_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.read().await.categories.contains(&id))
    }

    async fn department_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.state.read().await.departments.contains_key(&id))
    }

    async fn administers_department(&self, user_id: Uuid, department_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.departments.get(&department_id) == Some(&Some(user_id)))
    }

    async fn find_contact(&self, user_id: Uuid) -> Result<Option<Contact>> {
        Ok(self.state.read().await.contacts.get(&user_id).cloned())
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    async fn commit_submission(
        &self,
        report: &Report,
        history: HistoryDraft,
    ) -> Result<HistoryEntry> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();

        staged.reports.insert(report.id, report.clone());
        let entry = staged.append_history(report.id, history);

        self.take_injected_failure()?;
        *state = staged;
        Ok(entry)
    }

    async fn commit_transition(&self, transition: Transition) -> Result<TransitionOutcome> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();

        let report = staged
            .reports
            .get_mut(&transition.report_id)
            .filter(|r| r.version == transition.expected_version)
            .ok_or_else(|| AppError::Conflict(CONCURRENT_UPDATE.to_string()))?;

        let now = Utc::now();
        report.status = transition.history.new_status;
        report.version += 1;
        report.updated_at = now;
        if let Some(url) = &transition.completion_photo_url {
            report.completion_photo_url = Some(url.clone());
        }
        if transition.history.new_status == ReportStatus::Resolved {
            report.resolved_at = Some(now);
            report.resolved_by = Some(transition.history.changed_by);
        }
        let report = report.clone();

        if let Some(previous) = transition.supersede_assignment {
            if let Some(a) = staged
                .assignments
                .iter_mut()
                .find(|a| a.id == previous && a.status.is_live())
            {
                a.status = AssignmentStatus::Completed;
                a.updated_at = now;
            }
        }

        if let Some(assignment) = transition.new_assignment {
            let live_exists = staged
                .assignments
                .iter()
                .any(|a| a.report_id == assignment.report_id && a.status.is_live());
            if live_exists {
                return Err(AppError::Conflict(
                    "Report already has a live assignment".to_string(),
                ));
            }
            staged.assignments.push(assignment);
        }

        let history = staged.append_history(transition.report_id, transition.history);

        if let Some(notification) = transition.notification {
            staged.notifications.push(notification);
        }

        self.take_injected_failure()?;
        *state = staged;
        Ok(TransitionOutcome { report, history })
    }
}
