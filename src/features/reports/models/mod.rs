mod assignment;
mod history;
mod report;

pub use assignment::{Assignment, AssignmentStatus};
pub use history::{HistoryDraft, HistoryEntry};
pub use report::{Report, ReportPriority, ReportStatus};

pub(crate) use assignment::ASSIGNMENT_COLUMNS;
pub(crate) use history::HISTORY_COLUMNS;
pub(crate) use report::REPORT_COLUMNS;
