use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ReportStatus;

/// Immutable ledger entry for one accepted transition
#[derive(Debug, Clone, FromRow)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub report_id: Uuid,
    /// 1-based position in the report's ledger
    pub seq: i32,
    /// `None` only for the initial `pending` entry
    pub previous_status: Option<ReportStatus>,
    pub new_status: ReportStatus,
    pub changed_by: Uuid,
    pub remarks: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Ledger entry before the store assigns its id, sequence and timestamp
#[derive(Debug, Clone)]
pub struct HistoryDraft {
    pub previous_status: Option<ReportStatus>,
    pub new_status: ReportStatus,
    pub changed_by: Uuid,
    pub remarks: Option<String>,
}

impl HistoryDraft {
    pub fn into_entry(self, report_id: Uuid, seq: i32) -> HistoryEntry {
        HistoryEntry {
            id: Uuid::now_v7(),
            report_id,
            seq,
            previous_status: self.previous_status,
            new_status: self.new_status,
            changed_by: self.changed_by,
            remarks: self.remarks,
            changed_at: Utc::now(),
        }
    }
}

pub(crate) const HISTORY_COLUMNS: &str =
    "id, report_id, seq, previous_status, new_status, changed_by, remarks, changed_at";
