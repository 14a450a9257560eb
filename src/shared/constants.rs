/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// LIFECYCLE MESSAGES
// =============================================================================

/// Remark written to the ledger when a citizen files a report
pub const SUBMITTED_REMARK: &str = "Report submitted by user.";

/// Remark written to the ledger when an admin delegates a report
pub const ASSIGNED_REMARK: &str = "Report assigned to official.";

/// Remark written to the ledger when an admin resolves a report without remarks
pub const RESOLVED_REMARK: &str = "Report marked as resolved.";

/// Prefix of uploaded object keys, per media kind
pub const PHOTO_FOLDER: &str = "reports/photos";
pub const VOICE_FOLDER: &str = "reports/voice";
pub const COMPLETION_PHOTO_FOLDER: &str = "reports/completion";
