//! The report lifecycle state machine.
//!
//! This service is the only writer of `Report.status`. Every operation runs
//! the same pipeline: role check, load the target (`NotFound`), ownership
//! scope, input validation, then one [`Transition`] committed through the
//! store's unit of work. The commit compares the report's `version` with the
//! one read here, so of two racing requests exactly one lands and the other
//! gets `Conflict` without writing anything.
//!
//! E-mails to the affected user go out after the commit on a spawned task.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::access_control::{AccessControl, Operation, Target};
use crate::core::config::LifecycleConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notifications::models::Notification;
use crate::features::reports::dtos::{
    AssignReportDto, AssignmentResponseDto, ChangeStatusDto, ReportDraftDto, ReportResponseDto,
    UpdateAssignmentStatusDto,
};
use crate::features::reports::models::{
    Assignment, AssignmentStatus, HistoryDraft, Report, ReportPriority, ReportStatus,
};
use crate::features::reports::policy::{ReassignmentPolicy, TransitionPolicy};
use crate::features::reports::repository::{LifecycleRepository, Transition};
use crate::modules::mail::{Notifier, OutgoingMail};
use crate::modules::storage::{BlobStore, MediaFile};
use crate::shared::constants::{
    ASSIGNED_REMARK, COMPLETION_PHOTO_FOLDER, PHOTO_FOLDER, RESOLVED_REMARK, SUBMITTED_REMARK,
    VOICE_FOLDER,
};

/// Report fields that passed validation
struct ValidDraft {
    title: String,
    description: String,
    category_id: Uuid,
    location_lat: f64,
    location_lng: f64,
    priority: ReportPriority,
}

fn required_text(value: Option<String>, message: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

fn validate_draft(draft: ReportDraftDto) -> Result<ValidDraft> {
    let title = required_text(draft.title, "Title is required")?;
    let description = required_text(draft.description, "Description is required")?;
    let category_id = draft
        .category_id
        .ok_or_else(|| AppError::Validation("Category is required".to_string()))?;

    let (Some(location_lat), Some(location_lng)) = (draft.location_lat, draft.location_lng) else {
        return Err(AppError::Validation(
            "Location latitude and longitude are required".to_string(),
        ));
    };
    if !(-90.0..=90.0).contains(&location_lat) {
        return Err(AppError::Validation(
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&location_lng) {
        return Err(AppError::Validation(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }

    Ok(ValidDraft {
        title,
        description,
        category_id,
        location_lat,
        location_lng,
        priority: draft.priority.unwrap_or_default(),
    })
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct LifecycleService {
    repo: Arc<dyn LifecycleRepository>,
    access: AccessControl,
    notifier: Arc<dyn Notifier>,
    blobs: Arc<dyn BlobStore>,
    transitions: TransitionPolicy,
    reassignment: ReassignmentPolicy,
}

impl LifecycleService {
    pub fn new(
        repo: Arc<dyn LifecycleRepository>,
        notifier: Arc<dyn Notifier>,
        blobs: Arc<dyn BlobStore>,
        config: &LifecycleConfig,
    ) -> Self {
        Self {
            access: AccessControl::new(repo.clone()),
            repo,
            notifier,
            blobs,
            transitions: config.transition_policy,
            reassignment: config.reassignment_policy,
        }
    }

    // =========================================================================
    // SUBMIT
    // =========================================================================

    /// File a new report whose media is already stored
    pub async fn submit(
        &self,
        user: &AuthenticatedUser,
        draft: ReportDraftDto,
        photo_url: Option<String>,
        voice_recording_url: Option<String>,
    ) -> Result<ReportResponseDto> {
        let draft = self
            .prepare_submission(user, draft, blank_to_none(photo_url.clone()).is_some())
            .await?;
        let photo_url = blank_to_none(photo_url).unwrap_or_default();

        self.persist_submission(user, draft, photo_url, blank_to_none(voice_recording_url))
            .await
    }

    /// File a new report, uploading its photo and optional voice note first.
    ///
    /// Nothing is uploaded unless the fields are valid, and nothing is
    /// persisted unless every upload succeeded.
    pub async fn submit_with_media(
        &self,
        user: &AuthenticatedUser,
        draft: ReportDraftDto,
        photo: Option<MediaFile>,
        voice_recording: Option<MediaFile>,
    ) -> Result<ReportResponseDto> {
        let draft = self
            .prepare_submission(user, draft, photo.is_some())
            .await?;
        let Some(photo) = photo else {
            return Err(AppError::Validation("Photo is required".to_string()));
        };

        let photo_url = self.blobs.upload(PHOTO_FOLDER, photo).await?;
        let voice_recording_url = match voice_recording {
            Some(voice) => match self.blobs.upload(VOICE_FOLDER, voice).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(
                        orphaned_url = %photo_url,
                        user_id = %user.user_id,
                        "Voice upload failed after photo upload; photo object left orphaned"
                    );
                    return Err(e);
                }
            },
            None => None,
        };

        self.persist_submission(user, draft, photo_url, voice_recording_url)
            .await
    }

    async fn prepare_submission(
        &self,
        user: &AuthenticatedUser,
        draft: ReportDraftDto,
        has_photo: bool,
    ) -> Result<ValidDraft> {
        self.access.authorize(user, Operation::SubmitReport)?;

        let draft = validate_draft(draft)?;
        if !has_photo {
            return Err(AppError::Validation("Photo is required".to_string()));
        }
        if !self.repo.category_exists(draft.category_id).await? {
            return Err(AppError::Validation("Category not found".to_string()));
        }

        Ok(draft)
    }

    async fn persist_submission(
        &self,
        user: &AuthenticatedUser,
        draft: ValidDraft,
        photo_url: String,
        voice_recording_url: Option<String>,
    ) -> Result<ReportResponseDto> {
        let now = Utc::now();
        let report = Report {
            id: Uuid::now_v7(),
            user_id: user.user_id,
            category_id: draft.category_id,
            title: draft.title,
            description: draft.description,
            photo_url,
            voice_recording_url,
            completion_photo_url: None,
            location_lat: draft.location_lat,
            location_lng: draft.location_lng,
            status: ReportStatus::Pending,
            priority: draft.priority,
            resolved_at: None,
            resolved_by: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .commit_submission(
                &report,
                HistoryDraft {
                    previous_status: None,
                    new_status: ReportStatus::Pending,
                    changed_by: user.user_id,
                    remarks: Some(SUBMITTED_REMARK.to_string()),
                },
            )
            .await?;

        tracing::info!(
            report_id = %report.id,
            user_id = %user.user_id,
            "Report submitted"
        );

        Ok(report.into())
    }

    // =========================================================================
    // ASSIGN
    // =========================================================================

    /// Delegate a report to an official of a department and move it to `in_progress`
    pub async fn assign(
        &self,
        user: &AuthenticatedUser,
        report_id: Uuid,
        dto: AssignReportDto,
    ) -> Result<AssignmentResponseDto> {
        self.access.authorize(user, Operation::AssignReport)?;
        let report = self.load_report(report_id).await?;
        self.access
            .authorize_target(user, Operation::AssignReport, Target::Report(&report))
            .await?;

        let (Some(department_id), Some(assignee_id)) = (dto.department_id, dto.assigned_to_user_id)
        else {
            return Err(AppError::Validation(
                "Department ID and assigned user ID are required".to_string(),
            ));
        };
        if report.status.is_terminal() {
            return Err(AppError::Validation(format!(
                "Cannot assign a {} report",
                report.status
            )));
        }
        if !self.repo.department_exists(department_id).await? {
            return Err(AppError::NotFound("Department not found".to_string()));
        }
        if self.repo.find_contact(assignee_id).await?.is_none() {
            return Err(AppError::NotFound("Assigned user not found".to_string()));
        }

        let supersede_assignment = match self.repo.live_assignment(report.id).await? {
            None => None,
            Some(live) => match self.reassignment {
                ReassignmentPolicy::Reject => {
                    return Err(AppError::Conflict(
                        "Report already has a live assignment".to_string(),
                    ))
                }
                ReassignmentPolicy::Supersede => Some(live.id),
            },
        };

        let now = Utc::now();
        let assignment = Assignment {
            id: Uuid::now_v7(),
            report_id: report.id,
            department_id,
            assigned_to: assignee_id,
            assigned_by: user.user_id,
            status: AssignmentStatus::Assigned,
            remarks: Some(blank_to_none(dto.remarks).unwrap_or_else(|| ASSIGNED_REMARK.to_string())),
            assigned_at: now,
            updated_at: now,
        };
        let message = format!("You have been assigned report \"{}\".", report.title);

        let outcome = self
            .repo
            .commit_transition(Transition {
                report_id: report.id,
                expected_version: report.version,
                history: HistoryDraft {
                    previous_status: Some(report.status),
                    new_status: ReportStatus::InProgress,
                    changed_by: user.user_id,
                    remarks: Some(ASSIGNED_REMARK.to_string()),
                },
                completion_photo_url: None,
                supersede_assignment,
                new_assignment: Some(assignment.clone()),
                notification: Some(Notification::unread(assignee_id, report.id, message.clone())),
            })
            .await?;

        tracing::info!(
            report_id = %report.id,
            from = %report.status,
            to = %outcome.report.status,
            actor = %user.user_id,
            assignee = %assignee_id,
            superseded = supersede_assignment.is_some(),
            "Report assigned"
        );
        self.email_in_background(assignee_id, "New report assignment", message);

        Ok(assignment.into())
    }

    // =========================================================================
    // CHANGE STATUS / RESOLVE
    // =========================================================================

    pub async fn change_status(
        &self,
        user: &AuthenticatedUser,
        report_id: Uuid,
        dto: ChangeStatusDto,
    ) -> Result<ReportResponseDto> {
        self.access.authorize(user, Operation::ChangeStatus)?;
        let report = self.load_report(report_id).await?;
        self.access
            .authorize_target(user, Operation::ChangeStatus, Target::Report(&report))
            .await?;

        let new_status = dto
            .new_status
            .ok_or_else(|| AppError::Validation("New status is required".to_string()))?;
        self.transitions.check(report.status, new_status)?;

        let remarks = blank_to_none(dto.remarks).unwrap_or_else(|| {
            format!("Status changed from {} to {}.", report.status, new_status)
        });
        let message = format!(
            "Your report \"{}\" changed from {} to {}.",
            report.title, report.status, new_status
        );

        self.commit_status_change(user, &report, new_status, remarks, None, message)
            .await
    }

    /// Resolve with a completion photo that is already stored
    pub async fn resolve(
        &self,
        user: &AuthenticatedUser,
        report_id: Uuid,
        completion_photo_url: Option<String>,
        remarks: Option<String>,
    ) -> Result<ReportResponseDto> {
        let completion_photo_url = blank_to_none(completion_photo_url);
        let report = self
            .prepare_resolution(user, report_id, completion_photo_url.is_some())
            .await?;

        self.finish_resolution(user, &report, completion_photo_url, remarks)
            .await
    }

    /// Resolve, uploading the completion photo once every check has passed
    pub async fn resolve_with_photo(
        &self,
        user: &AuthenticatedUser,
        report_id: Uuid,
        photo: Option<MediaFile>,
        remarks: Option<String>,
    ) -> Result<ReportResponseDto> {
        let report = self
            .prepare_resolution(user, report_id, photo.is_some())
            .await?;
        let Some(photo) = photo else {
            return Err(AppError::Validation(
                "Completion photo is required".to_string(),
            ));
        };

        let url = self.blobs.upload(COMPLETION_PHOTO_FOLDER, photo).await?;
        self.finish_resolution(user, &report, Some(url), remarks)
            .await
    }

    async fn prepare_resolution(
        &self,
        user: &AuthenticatedUser,
        report_id: Uuid,
        has_photo: bool,
    ) -> Result<Report> {
        self.access.authorize(user, Operation::ResolveReport)?;
        let report = self.load_report(report_id).await?;
        self.access
            .authorize_target(user, Operation::ResolveReport, Target::Report(&report))
            .await?;

        if !has_photo {
            return Err(AppError::Validation(
                "Completion photo is required".to_string(),
            ));
        }
        self.transitions
            .check(report.status, ReportStatus::Resolved)?;

        Ok(report)
    }

    async fn finish_resolution(
        &self,
        user: &AuthenticatedUser,
        report: &Report,
        completion_photo_url: Option<String>,
        remarks: Option<String>,
    ) -> Result<ReportResponseDto> {
        let remarks = blank_to_none(remarks).unwrap_or_else(|| RESOLVED_REMARK.to_string());
        let message = format!("Your report \"{}\" has been resolved.", report.title);

        self.commit_status_change(
            user,
            report,
            ReportStatus::Resolved,
            remarks,
            completion_photo_url,
            message,
        )
        .await
    }

    /// Commit a move of `report` to `new_status` and notify its submitter
    async fn commit_status_change(
        &self,
        user: &AuthenticatedUser,
        report: &Report,
        new_status: ReportStatus,
        remarks: String,
        completion_photo_url: Option<String>,
        message: String,
    ) -> Result<ReportResponseDto> {
        let outcome = self
            .repo
            .commit_transition(Transition {
                report_id: report.id,
                expected_version: report.version,
                history: HistoryDraft {
                    previous_status: Some(report.status),
                    new_status,
                    changed_by: user.user_id,
                    remarks: Some(remarks),
                },
                completion_photo_url,
                supersede_assignment: None,
                new_assignment: None,
                notification: Some(Notification::unread(
                    report.user_id,
                    report.id,
                    message.clone(),
                )),
            })
            .await?;

        tracing::info!(
            report_id = %report.id,
            from = %report.status,
            to = %new_status,
            actor = %user.user_id,
            seq = outcome.history.seq,
            "Report status changed"
        );
        self.email_in_background(report.user_id, "Update on your report", message);

        Ok(outcome.report.into())
    }

    // =========================================================================
    // ASSIGNMENT STATUS
    // =========================================================================

    /// Progress update by the assignee. Does not touch the report's status.
    pub async fn update_assignment_status(
        &self,
        user: &AuthenticatedUser,
        assignment_id: Uuid,
        dto: UpdateAssignmentStatusDto,
    ) -> Result<AssignmentResponseDto> {
        self.access
            .authorize(user, Operation::UpdateAssignmentStatus)?;
        let assignment = self
            .repo
            .find_assignment(assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;
        self.access
            .authorize_target(
                user,
                Operation::UpdateAssignmentStatus,
                Target::Assignment(&assignment),
            )
            .await?;

        let new_status = dto
            .new_status
            .ok_or_else(|| AppError::Validation("New status is required".to_string()))?;
        if assignment.status == AssignmentStatus::Completed {
            return Err(AppError::Validation(
                "Assignment is already completed".to_string(),
            ));
        }
        if assignment.status == new_status {
            return Err(AppError::Validation(format!(
                "Assignment is already {}",
                new_status
            )));
        }

        let updated = self
            .repo
            .update_assignment_status(assignment.id, assignment.status, new_status)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "Assignment was modified by another request, reload and try again".to_string(),
                )
            })?;

        tracing::info!(
            assignment_id = %assignment.id,
            report_id = %assignment.report_id,
            from = %assignment.status,
            to = %new_status,
            "Assignment status updated"
        );

        Ok(updated.into())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    async fn load_report(&self, report_id: Uuid) -> Result<Report> {
        self.repo
            .find_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Report not found".to_string()))
    }

    /// Mail `recipient` off the request path; failures are logged only
    fn email_in_background(&self, recipient: Uuid, subject: &str, message: String) {
        let repo = Arc::clone(&self.repo);
        let notifier = Arc::clone(&self.notifier);
        let subject = subject.to_string();

        tokio::spawn(async move {
            let contact = match repo.find_contact(recipient).await {
                Ok(Some(contact)) => contact,
                Ok(None) => {
                    tracing::warn!(user_id = %recipient, "No contact for notification e-mail");
                    return;
                }
                Err(e) => {
                    tracing::warn!(user_id = %recipient, "Failed to look up e-mail recipient: {}", e);
                    return;
                }
            };

            let mail = OutgoingMail {
                to: contact.email,
                subject,
                body: format!("Hello {},\n\n{}", contact.name, message),
            };
            if let Err(e) = notifier.send(&mail).await {
                tracing::warn!(user_id = %recipient, "Failed to send notification e-mail: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::repository::memory::MemoryStore;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::create_user;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::{mpsc, Barrier};

    struct FakeBlobStore {
        fail: bool,
        failing_folder: Option<&'static str>,
    }

    #[async_trait]
    impl BlobStore for FakeBlobStore {
        async fn upload(&self, folder: &str, file: MediaFile) -> Result<String> {
            if self.fail || self.failing_folder == Some(folder) {
                return Err(AppError::ExternalServiceError(
                    "Media upload timed out after 30s".to_string(),
                ));
            }
            Ok(format!("http://media.test/{}", file.object_path(folder)))
        }
    }

    struct RecordingNotifier {
        sent: mpsc::UnboundedSender<OutgoingMail>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, mail: &OutgoingMail) -> Result<()> {
            let _ = self.sent.send(mail.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _mail: &OutgoingMail) -> Result<()> {
            Err(AppError::ExternalServiceError("mail API down".to_string()))
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        service: LifecycleService,
        mails: mpsc::UnboundedReceiver<OutgoingMail>,
        citizen: AuthenticatedUser,
        super_admin: AuthenticatedUser,
        official: AuthenticatedUser,
        department_id: Uuid,
        category_id: Uuid,
    }

    struct Options {
        store: MemoryStore,
        failing_uploads: bool,
        failing_folder: Option<&'static str>,
        failing_mail: bool,
        lifecycle: LifecycleConfig,
    }

    impl Default for Options {
        fn default() -> Self {
            Self {
                store: MemoryStore::new(),
                failing_uploads: false,
                failing_folder: None,
                failing_mail: false,
                lifecycle: LifecycleConfig {
                    transition_policy: TransitionPolicy::Permissive,
                    reassignment_policy: ReassignmentPolicy::Reject,
                },
            }
        }
    }

    async fn harness(options: Options) -> Harness {
        let store = Arc::new(options.store);
        let (tx, mails) = mpsc::unbounded_channel();
        let notifier: Arc<dyn Notifier> = if options.failing_mail {
            Arc::new(FailingNotifier)
        } else {
            Arc::new(RecordingNotifier { sent: tx })
        };
        let service = LifecycleService::new(
            store.clone(),
            notifier,
            Arc::new(FakeBlobStore {
                fail: options.failing_uploads,
                failing_folder: options.failing_folder,
            }),
            &options.lifecycle,
        );

        let citizen = create_user(UserRole::Citizen);
        let super_admin = create_user(UserRole::SuperAdmin);
        let official = create_user(UserRole::DepartmentAdmin);
        store
            .add_contact(citizen.user_id, "Citizen", &citizen.email)
            .await;
        store
            .add_contact(official.user_id, "Official", &official.email)
            .await;
        let department_id = store.add_department(Some(official.user_id)).await;
        let category_id = store.add_category().await;

        Harness {
            store,
            service,
            mails,
            citizen,
            super_admin,
            official,
            department_id,
            category_id,
        }
    }

    fn photo(name: &str) -> MediaFile {
        MediaFile {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    fn pothole(category_id: Uuid) -> ReportDraftDto {
        ReportDraftDto {
            title: Some("Pothole".to_string()),
            description: Some("Large pothole".to_string()),
            category_id: Some(category_id),
            location_lat: Some(10.0),
            location_lng: Some(20.0),
            priority: None,
        }
    }

    async fn submitted(h: &Harness) -> ReportResponseDto {
        h.service
            .submit_with_media(
                &h.citizen,
                pothole(h.category_id),
                Some(photo("pothole.jpg")),
                None,
            )
            .await
            .unwrap()
    }

    fn assign_to(h: &Harness) -> AssignReportDto {
        AssignReportDto {
            department_id: Some(h.department_id),
            assigned_to_user_id: Some(h.official.user_id),
            remarks: None,
        }
    }

    fn status(new_status: ReportStatus) -> ChangeStatusDto {
        ChangeStatusDto {
            new_status: Some(new_status),
            remarks: None,
        }
    }

    async fn next_mail(h: &mut Harness) -> OutgoingMail {
        tokio::time::timeout(Duration::from_secs(2), h.mails.recv())
            .await
            .expect("no e-mail within 2s")
            .expect("mail channel closed")
    }

    #[tokio::test]
    async fn test_submit_creates_pending_report_with_initial_entry() {
        let h = harness(Options::default()).await;

        let report = submitted(&h).await;

        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.title, "Pothole");
        assert_eq!(report.priority, ReportPriority::Medium);
        assert!(report.photo_url.starts_with("http://media.test/reports/photos/"));
        assert!(report.completion_photo_url.is_none());

        let history = h.store.history(report.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].previous_status, None);
        assert_eq!(history[0].new_status, ReportStatus::Pending);
        assert_eq!(history[0].changed_by, h.citizen.user_id);
        assert_eq!(history[0].seq, 1);
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let h = harness(Options::default()).await;

        let mut draft = pothole(h.category_id);
        draft.title = Some("   ".to_string());
        let result = h
            .service
            .submit_with_media(&h.citizen, draft, Some(photo("a.jpg")), None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(m)) if m == "Title is required"));

        let result = h
            .service
            .submit_with_media(&h.citizen, pothole(h.category_id), None, None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(m)) if m == "Photo is required"));

        let result = h
            .service
            .submit_with_media(&h.citizen, pothole(Uuid::now_v7()), Some(photo("a.jpg")), None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(m)) if m == "Category not found"));

        let mut draft = pothole(h.category_id);
        draft.location_lat = Some(91.0);
        let result = h
            .service
            .submit_with_media(&h.citizen, draft, Some(photo("a.jpg")), None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        assert_eq!(h.store.report_count().await, 0);
    }

    #[tokio::test]
    async fn test_submit_with_stored_media_urls() {
        let h = harness(Options::default()).await;

        let report = h
            .service
            .submit(
                &h.citizen,
                pothole(h.category_id),
                Some("http://cdn.test/p.jpg".to_string()),
                Some("http://cdn.test/v.mp3".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(report.photo_url, "http://cdn.test/p.jpg");
        assert_eq!(
            report.voice_recording_url.as_deref(),
            Some("http://cdn.test/v.mp3")
        );

        let result = h
            .service
            .submit(&h.citizen, pothole(h.category_id), Some(" ".to_string()), None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_upload_persists_nothing() {
        let h = harness(Options {
            failing_uploads: true,
            ..Options::default()
        })
        .await;

        let result = h
            .service
            .submit_with_media(
                &h.citizen,
                pothole(h.category_id),
                Some(photo("a.jpg")),
                Some(photo("note.mp3")),
            )
            .await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
        assert_eq!(h.store.report_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_voice_upload_after_photo_persists_nothing() {
        let h = harness(Options {
            failing_folder: Some(VOICE_FOLDER),
            ..Options::default()
        })
        .await;

        let result = h
            .service
            .submit_with_media(
                &h.citizen,
                pothole(h.category_id),
                Some(photo("a.jpg")),
                Some(photo("note.mp3")),
            )
            .await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
        assert_eq!(h.store.report_count().await, 0);

        // Without a voice note the same store accepts the report
        assert!(h
            .service
            .submit_with_media(&h.citizen, pothole(h.category_id), Some(photo("b.jpg")), None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_validation_runs_before_upload() {
        let h = harness(Options {
            failing_uploads: true,
            ..Options::default()
        })
        .await;

        let mut draft = pothole(h.category_id);
        draft.description = None;
        let result = h
            .service
            .submit_with_media(&h.citizen, draft, Some(photo("a.jpg")), None)
            .await;

        // A failing upload would have surfaced as ExternalServiceError
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_assign_moves_report_to_in_progress_and_notifies_assignee() {
        let mut h = harness(Options::default()).await;
        let report = submitted(&h).await;

        let assignment = h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();

        assert_eq!(assignment.status, AssignmentStatus::Assigned);
        assert_eq!(assignment.report_id, report.id);
        assert_eq!(assignment.department_id, h.department_id);
        assert_eq!(assignment.assigned_to, h.official.user_id);
        assert_eq!(assignment.assigned_by, h.super_admin.user_id);

        let stored = h.store.report(report.id).await.unwrap();
        assert_eq!(stored.status, ReportStatus::InProgress);
        assert_eq!(stored.version, 2);

        let history = h.store.history(report.id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].previous_status, Some(ReportStatus::Pending));
        assert_eq!(history[1].new_status, ReportStatus::InProgress);

        let notifications = h.store.all_notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].user_id, h.official.user_id);

        let mail = next_mail(&mut h).await;
        assert_eq!(mail.to, h.official.email);
        assert!(mail.body.contains("Pothole"));
    }

    #[tokio::test]
    async fn test_resolve_sets_completion_photo_and_notifies_submitter() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;
        h.service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();

        let resolved = h
            .service
            .resolve_with_photo(&h.official, report.id, Some(photo("fixed.png")), None)
            .await
            .unwrap();

        assert_eq!(resolved.status, ReportStatus::Resolved);
        assert!(resolved
            .completion_photo_url
            .as_deref()
            .is_some_and(|u| u.contains("reports/completion/")));
        assert_eq!(resolved.resolved_by, Some(h.official.user_id));
        assert!(resolved.resolved_at.is_some());

        let history = h.store.history(report.id).await;
        let last = history.last().unwrap();
        assert_eq!(last.previous_status, Some(ReportStatus::InProgress));
        assert_eq!(last.new_status, ReportStatus::Resolved);
        assert_eq!(last.remarks.as_deref(), Some(RESOLVED_REMARK));

        let notifications = h.store.all_notifications().await;
        assert!(notifications
            .iter()
            .any(|n| n.user_id == h.citizen.user_id && n.report_id == report.id));
    }

    #[tokio::test]
    async fn test_resolve_requires_photo() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;

        let result = h
            .service
            .resolve_with_photo(&h.super_admin, report.id, None, None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = h
            .service
            .resolve(&h.super_admin, report.id, None, Some("done".to_string()))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(h.store.history(report.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_completion_upload_leaves_report_untouched() {
        let h = harness(Options {
            failing_uploads: true,
            ..Options::default()
        })
        .await;
        let report = h
            .service
            .submit(
                &h.citizen,
                pothole(h.category_id),
                Some("http://cdn.test/p.jpg".to_string()),
                None,
            )
            .await
            .unwrap();

        let result = h
            .service
            .resolve_with_photo(&h.super_admin, report.id, Some(photo("fixed.jpg")), None)
            .await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
        let stored = h.store.report(report.id).await.unwrap();
        assert_eq!(stored.status, ReportStatus::Pending);
        assert!(stored.completion_photo_url.is_none());
        assert_eq!(h.store.history(report.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_same_status_is_rejected_without_new_entry() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;

        let result = h
            .service
            .change_status(&h.super_admin, report.id, status(ReportStatus::Pending))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        let stored = h.store.report(report.id).await.unwrap();
        assert_eq!(stored.status, ReportStatus::Pending);
        assert_eq!(stored.version, 1);
        assert_eq!(h.store.history(report.id).await.len(), 1);
        assert!(h.store.all_notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_status_is_rejected() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;

        let result = h
            .service
            .change_status(
                &h.super_admin,
                report.id,
                ChangeStatusDto {
                    new_status: None,
                    remarks: Some("why".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(m)) if m == "New status is required"));
    }

    #[tokio::test]
    async fn test_assign_missing_report_creates_nothing() {
        let h = harness(Options::default()).await;

        let result = h
            .service
            .assign(&h.super_admin, Uuid::now_v7(), assign_to(&h))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(h.store.all_notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_assign_checks_existence_before_fields() {
        let h = harness(Options::default()).await;

        let result = h
            .service
            .assign(
                &h.super_admin,
                Uuid::now_v7(),
                AssignReportDto {
                    department_id: None,
                    assigned_to_user_id: None,
                    remarks: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let report = submitted(&h).await;
        let result = h
            .service
            .assign(
                &h.super_admin,
                report.id,
                AssignReportDto {
                    department_id: Some(h.department_id),
                    assigned_to_user_id: None,
                    remarks: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = h
            .service
            .assign(
                &h.super_admin,
                report.id,
                AssignReportDto {
                    department_id: Some(Uuid::now_v7()),
                    assigned_to_user_id: Some(h.official.user_id),
                    remarks: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(m)) if m == "Department not found"));
    }

    #[tokio::test]
    async fn test_citizen_cannot_assign() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;

        let result = h.service.assign(&h.citizen, report.id, assign_to(&h)).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(h.store.assignments(report.id).await.is_empty());
        assert_eq!(h.store.history(report.id).await.len(), 1);
        assert_eq!(
            h.store.report(report.id).await.unwrap().status,
            ReportStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_admin_cannot_submit() {
        let h = harness(Options::default()).await;

        let result = h
            .service
            .submit_with_media(
                &h.super_admin,
                pothole(h.category_id),
                Some(photo("a.jpg")),
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_history_is_a_chain_of_accepted_transitions() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;

        h.service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();
        h.service
            .change_status(&h.official, report.id, status(ReportStatus::Pending))
            .await
            .unwrap();
        // Rejected no-op does not count
        assert!(h
            .service
            .change_status(&h.official, report.id, status(ReportStatus::Pending))
            .await
            .is_err());
        h.service
            .change_status(&h.official, report.id, status(ReportStatus::InProgress))
            .await
            .unwrap();
        h.service
            .resolve(
                &h.official,
                report.id,
                Some("http://cdn.test/done.jpg".to_string()),
                None,
            )
            .await
            .unwrap();

        let history = h.store.history(report.id).await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].previous_status, None);
        for (i, pair) in history.windows(2).enumerate() {
            assert_eq!(pair[1].previous_status, Some(pair[0].new_status));
            assert_eq!(pair[0].seq, i as i32 + 1);
        }

        let stored = h.store.report(report.id).await.unwrap();
        assert_eq!(stored.status, history[4].new_status);
        assert_eq!(stored.version, 5);
    }

    #[tokio::test]
    async fn test_default_remark_names_both_statuses() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;

        h.service
            .change_status(&h.super_admin, report.id, status(ReportStatus::Rejected))
            .await
            .unwrap();

        let history = h.store.history(report.id).await;
        assert_eq!(
            history[1].remarks.as_deref(),
            Some("Status changed from pending to rejected.")
        );
    }

    #[tokio::test]
    async fn test_concurrent_status_changes_have_one_winner() {
        let barrier = Arc::new(Barrier::new(2));
        let h = harness(Options {
            store: MemoryStore::new().with_read_barrier(barrier),
            ..Options::default()
        })
        .await;
        let report = submitted(&h).await;

        // Both calls read version 1 before either commits
        let (first, second) = tokio::join!(
            h.service
                .change_status(&h.super_admin, report.id, status(ReportStatus::InProgress)),
            h.service
                .change_status(&h.super_admin, report.id, status(ReportStatus::Rejected)),
        );

        let results = [&first, &second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(AppError::Conflict(_))))
                .count(),
            1
        );

        let winner = first.as_ref().or(second.as_ref()).unwrap();
        let history = h.store.history(report.id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].previous_status, Some(ReportStatus::Pending));
        assert_eq!(history[1].new_status, winner.status);
        assert_eq!(h.store.all_notifications().await.len(), 1);

        let stored = h.store.report(report.id).await.unwrap();
        assert_eq!(stored.status, winner.status);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back_every_write() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;

        h.store.fail_next_commit();
        let result = h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        let stored = h.store.report(report.id).await.unwrap();
        assert_eq!(stored.status, ReportStatus::Pending);
        assert_eq!(stored.version, 1);
        assert_eq!(h.store.history(report.id).await.len(), 1);
        assert!(h.store.assignments(report.id).await.is_empty());
        assert!(h.store.all_notifications().await.is_empty());

        // The store is usable again afterwards
        assert!(h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_failed_submission_commit_leaves_no_report() {
        let h = harness(Options::default()).await;

        h.store.fail_next_commit();
        let result = h
            .service
            .submit_with_media(&h.citizen, pothole(h.category_id), Some(photo("a.jpg")), None)
            .await;

        assert!(result.is_err());
        assert_eq!(h.store.report_count().await, 0);
    }

    #[tokio::test]
    async fn test_strict_policy_blocks_reopening() {
        let h = harness(Options {
            lifecycle: LifecycleConfig {
                transition_policy: TransitionPolicy::Strict,
                reassignment_policy: ReassignmentPolicy::Reject,
            },
            ..Options::default()
        })
        .await;
        let report = submitted(&h).await;
        h.service
            .resolve(
                &h.super_admin,
                report.id,
                Some("http://cdn.test/done.jpg".to_string()),
                None,
            )
            .await
            .unwrap();

        let result = h
            .service
            .change_status(&h.super_admin, report.id, status(ReportStatus::Pending))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        // Terminal reports cannot be assigned either
        let result = h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(h.store.history(report.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_second_assignment_is_rejected_by_default() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;
        h.service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();

        let result = h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(h.store.assignments(report.id).await.len(), 1);
        assert_eq!(h.store.history(report.id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_supersede_completes_live_assignment() {
        let h = harness(Options {
            lifecycle: LifecycleConfig {
                transition_policy: TransitionPolicy::Permissive,
                reassignment_policy: ReassignmentPolicy::Supersede,
            },
            ..Options::default()
        })
        .await;
        let report = submitted(&h).await;
        let first = h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();

        let second = h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();

        let assignments = h.store.assignments(report.id).await;
        assert_eq!(assignments.len(), 2);
        let live: Vec<_> = assignments.iter().filter(|a| a.status.is_live()).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, second.id);
        assert!(assignments
            .iter()
            .any(|a| a.id == first.id && a.status == AssignmentStatus::Completed));
        assert_eq!(h.store.history(report.id).await.len(), 3);
    }

    #[tokio::test]
    async fn test_only_assignee_updates_assignment() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;
        let assignment = h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();
        let update = |s| UpdateAssignmentStatusDto { new_status: Some(s) };

        let result = h
            .service
            .update_assignment_status(
                &h.super_admin,
                assignment.id,
                update(AssignmentStatus::InProgress),
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let updated = h
            .service
            .update_assignment_status(
                &h.official,
                assignment.id,
                update(AssignmentStatus::InProgress),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AssignmentStatus::InProgress);

        let result = h
            .service
            .update_assignment_status(
                &h.official,
                assignment.id,
                update(AssignmentStatus::InProgress),
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        h.service
            .update_assignment_status(
                &h.official,
                assignment.id,
                update(AssignmentStatus::Completed),
            )
            .await
            .unwrap();
        let result = h
            .service
            .update_assignment_status(&h.official, assignment.id, update(AssignmentStatus::Assigned))
            .await;
        assert!(matches!(result, Err(AppError::Validation(m)) if m == "Assignment is already completed"));

        // The report itself is untouched by assignment progress
        assert_eq!(h.store.history(report.id).await.len(), 2);

        let result = h
            .service
            .update_assignment_status(
                &h.official,
                Uuid::now_v7(),
                update(AssignmentStatus::InProgress),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_department_admin_scope() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;

        // Not yet assigned to the official's department
        let result = h
            .service
            .change_status(&h.official, report.id, status(ReportStatus::Rejected))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        h.service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();

        let outsider = create_user(UserRole::DepartmentAdmin);
        h.store.add_department(Some(outsider.user_id)).await;
        let result = h
            .service
            .change_status(&outsider, report.id, status(ReportStatus::Rejected))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        assert!(h
            .service
            .change_status(&h.official, report.id, status(ReportStatus::Rejected))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_admin_of_several_departments_owns_each() {
        let h = harness(Options::default()).await;
        let second_department = h.store.add_department(Some(h.official.user_id)).await;

        let first = submitted(&h).await;
        let second = submitted(&h).await;
        h.service
            .assign(&h.super_admin, first.id, assign_to(&h))
            .await
            .unwrap();
        h.service
            .assign(
                &h.super_admin,
                second.id,
                AssignReportDto {
                    department_id: Some(second_department),
                    ..assign_to(&h)
                },
            )
            .await
            .unwrap();

        for report_id in [first.id, second.id] {
            let result = h
                .service
                .change_status(&h.official, report_id, status(ReportStatus::Rejected))
                .await;
            assert!(result.is_ok(), "report {} should be in scope", report_id);
        }
    }

    #[tokio::test]
    async fn test_superseded_department_loses_scope() {
        let h = harness(Options {
            lifecycle: LifecycleConfig {
                transition_policy: TransitionPolicy::Permissive,
                reassignment_policy: ReassignmentPolicy::Supersede,
            },
            ..Options::default()
        })
        .await;
        let other = create_user(UserRole::DepartmentAdmin);
        h.store.add_contact(other.user_id, "Other", &other.email).await;
        let other_department = h.store.add_department(Some(other.user_id)).await;

        let report = submitted(&h).await;
        h.service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();
        h.service
            .assign(
                &h.super_admin,
                report.id,
                AssignReportDto {
                    department_id: Some(other_department),
                    assigned_to_user_id: Some(other.user_id),
                    remarks: None,
                },
            )
            .await
            .unwrap();

        // Reassignment is recorded as in_progress -> in_progress
        let history = h.store.history(report.id).await;
        let last = history.last().unwrap();
        assert_eq!(last.previous_status, Some(ReportStatus::InProgress));
        assert_eq!(last.new_status, ReportStatus::InProgress);

        let result = h
            .service
            .change_status(&h.official, report.id, status(ReportStatus::Rejected))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        let result = h
            .service
            .resolve(
                &h.official,
                report.id,
                Some("http://cdn.test/done.jpg".to_string()),
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        assert!(h
            .service
            .change_status(&other, report.id, status(ReportStatus::Rejected))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_completed_assignment_still_scopes_its_department() {
        let h = harness(Options::default()).await;
        let report = submitted(&h).await;
        let assignment = h
            .service
            .assign(&h.super_admin, report.id, assign_to(&h))
            .await
            .unwrap();
        h.service
            .update_assignment_status(
                &h.official,
                assignment.id,
                UpdateAssignmentStatusDto {
                    new_status: Some(AssignmentStatus::Completed),
                },
            )
            .await
            .unwrap();

        let resolved = h
            .service
            .resolve(
                &h.official,
                report.id,
                Some("http://cdn.test/done.jpg".to_string()),
                None,
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_abort_transition() {
        let h = harness(Options {
            failing_mail: true,
            ..Options::default()
        })
        .await;
        let report = submitted(&h).await;

        let result = h
            .service
            .change_status(&h.super_admin, report.id, status(ReportStatus::Rejected))
            .await;

        assert!(result.is_ok());
        assert_eq!(h.store.all_notifications().await.len(), 1);
        assert_eq!(
            h.store.report(report.id).await.unwrap().status,
            ReportStatus::Rejected
        );
    }
}
