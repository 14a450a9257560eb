//! Policy table gating every lifecycle operation.
//!
//! Checks run in two steps: [`AccessControl::authorize`] looks only at the
//! caller's role and runs before anything is loaded, and
//! [`AccessControl::authorize_target`] applies the ownership scope once the
//! target report or assignment is known. Any missing linkage denies access.

use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::models::{Assignment, Report};
use crate::features::reports::repository::LifecycleRepository;
use crate::features::users::models::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SubmitReport,
    AssignReport,
    ChangeStatus,
    ResolveReport,
    UpdateAssignmentStatus,
    ViewReport,
    ListAllReports,
}

impl Operation {
    fn describe(&self) -> &'static str {
        match self {
            Operation::SubmitReport => "submit reports",
            Operation::AssignReport => "assign reports",
            Operation::ChangeStatus => "change the status of this report",
            Operation::ResolveReport => "resolve this report",
            Operation::UpdateAssignmentStatus => "update this assignment",
            Operation::ViewReport => "view this report",
            Operation::ListAllReports => "list all reports",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Role alone decides
    Unscoped,
    /// Department admins only for reports assigned to their department
    OwningDepartment,
    /// Only the assignee of the target assignment, whatever the role
    Assignee,
    /// Submitter, any admin, or anyone the report was ever assigned to
    Participant,
}

struct Rule {
    roles: &'static [UserRole],
    scope: Scope,
}

const ADMINS: &[UserRole] = &[UserRole::DepartmentAdmin, UserRole::SuperAdmin];
const EVERYONE: &[UserRole] = &[
    UserRole::Citizen,
    UserRole::DepartmentAdmin,
    UserRole::SuperAdmin,
];

fn rule(operation: Operation) -> Rule {
    match operation {
        Operation::SubmitReport => Rule {
            roles: &[UserRole::Citizen],
            scope: Scope::Unscoped,
        },
        Operation::AssignReport => Rule {
            roles: ADMINS,
            scope: Scope::Unscoped,
        },
        Operation::ChangeStatus | Operation::ResolveReport => Rule {
            roles: ADMINS,
            scope: Scope::OwningDepartment,
        },
        Operation::UpdateAssignmentStatus => Rule {
            roles: EVERYONE,
            scope: Scope::Assignee,
        },
        Operation::ViewReport => Rule {
            roles: EVERYONE,
            scope: Scope::Participant,
        },
        Operation::ListAllReports => Rule {
            roles: ADMINS,
            scope: Scope::Unscoped,
        },
    }
}

/// What a scoped check is evaluated against
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Report(&'a Report),
    Assignment(&'a Assignment),
}

pub struct AccessControl {
    repo: Arc<dyn LifecycleRepository>,
}

impl AccessControl {
    pub fn new(repo: Arc<dyn LifecycleRepository>) -> Self {
        Self { repo }
    }

    /// Role check
    pub fn authorize(&self, user: &AuthenticatedUser, operation: Operation) -> Result<()> {
        if rule(operation).roles.contains(&user.role) {
            Ok(())
        } else {
            Err(forbidden(operation))
        }
    }

    /// Role check followed by the operation's ownership scope on `target`
    pub async fn authorize_target(
        &self,
        user: &AuthenticatedUser,
        operation: Operation,
        target: Target<'_>,
    ) -> Result<()> {
        self.authorize(user, operation)?;

        let allowed = match (rule(operation).scope, target) {
            (Scope::Unscoped, _) => true,
            (Scope::OwningDepartment, Target::Report(report)) => {
                self.owns_report(user, report).await?
            }
            (Scope::Assignee, Target::Assignment(assignment)) => {
                assignment.assigned_to == user.user_id
            }
            (Scope::Participant, Target::Report(report)) => {
                report.user_id == user.user_id
                    || user.is_admin()
                    || self.repo.is_assignee(report.id, user.user_id).await?
            }
            // Scope does not apply to this kind of target
            _ => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(forbidden(operation))
        }
    }

    /// The report's current assignment (live, else most recent) must belong to
    /// a department the caller administers
    async fn owns_report(&self, user: &AuthenticatedUser, report: &Report) -> Result<bool> {
        if user.is_super_admin() {
            return Ok(true);
        }

        let current = match self.repo.live_assignment(report.id).await? {
            Some(live) => Some(live),
            None => self.repo.latest_assignment(report.id).await?,
        };
        let Some(current) = current else {
            return Ok(false);
        };

        self.repo
            .administers_department(user.user_id, current.department_id)
            .await
    }
}

fn forbidden(operation: Operation) -> AppError {
    AppError::Forbidden(format!(
        "You do not have permission to {}",
        operation.describe()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::repository::memory::MemoryStore;
    use crate::shared::test_helpers::create_user;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::features::reports::models::{AssignmentStatus, ReportPriority, ReportStatus};

    fn report_by(user_id: Uuid) -> Report {
        let now = Utc::now();
        Report {
            id: Uuid::now_v7(),
            user_id,
            category_id: Uuid::now_v7(),
            title: "Broken streetlight".to_string(),
            description: "Dark at night".to_string(),
            photo_url: "http://media/photo.jpg".to_string(),
            voice_recording_url: None,
            completion_photo_url: None,
            location_lat: 1.0,
            location_lng: 2.0,
            status: ReportStatus::Pending,
            priority: ReportPriority::Medium,
            resolved_at: None,
            resolved_by: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn assignment_to(assigned_to: Uuid) -> Assignment {
        let now = Utc::now();
        Assignment {
            id: Uuid::now_v7(),
            report_id: Uuid::now_v7(),
            department_id: Uuid::now_v7(),
            assigned_to,
            assigned_by: Uuid::now_v7(),
            status: AssignmentStatus::Assigned,
            remarks: None,
            assigned_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_role_table() {
        let access = AccessControl::new(Arc::new(MemoryStore::new()));
        let citizen = create_user(UserRole::Citizen);
        let dept_admin = create_user(UserRole::DepartmentAdmin);
        let super_admin = create_user(UserRole::SuperAdmin);

        assert!(access.authorize(&citizen, Operation::SubmitReport).is_ok());
        assert!(access.authorize(&dept_admin, Operation::SubmitReport).is_err());
        assert!(matches!(
            access.authorize(&citizen, Operation::AssignReport),
            Err(AppError::Forbidden(_))
        ));
        assert!(access.authorize(&dept_admin, Operation::AssignReport).is_ok());
        assert!(access.authorize(&super_admin, Operation::ListAllReports).is_ok());
        assert!(access.authorize(&citizen, Operation::ListAllReports).is_err());
    }

    #[tokio::test]
    async fn test_department_scope_fails_closed() {
        let store = Arc::new(MemoryStore::new());
        let access = AccessControl::new(store.clone());
        let dept_admin = create_user(UserRole::DepartmentAdmin);
        let report = report_by(Uuid::now_v7());

        // No department administered by the caller
        let result = access
            .authorize_target(&dept_admin, Operation::ChangeStatus, Target::Report(&report))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        // Department exists but the report was never assigned to it
        store.add_department(Some(dept_admin.user_id)).await;
        let result = access
            .authorize_target(&dept_admin, Operation::ResolveReport, Target::Report(&report))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let super_admin = create_user(UserRole::SuperAdmin);
        assert!(access
            .authorize_target(&super_admin, Operation::ChangeStatus, Target::Report(&report))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_assignee_scope_has_no_admin_bypass() {
        let access = AccessControl::new(Arc::new(MemoryStore::new()));
        let assignee = create_user(UserRole::DepartmentAdmin);
        let super_admin = create_user(UserRole::SuperAdmin);
        let assignment = assignment_to(assignee.user_id);

        assert!(access
            .authorize_target(
                &assignee,
                Operation::UpdateAssignmentStatus,
                Target::Assignment(&assignment)
            )
            .await
            .is_ok());
        assert!(access
            .authorize_target(
                &super_admin,
                Operation::UpdateAssignmentStatus,
                Target::Assignment(&assignment)
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_report_visibility() {
        let access = AccessControl::new(Arc::new(MemoryStore::new()));
        let submitter = create_user(UserRole::Citizen);
        let stranger = create_user(UserRole::Citizen);
        let admin = create_user(UserRole::DepartmentAdmin);
        let report = report_by(submitter.user_id);

        for (user, visible) in [(&submitter, true), (&stranger, false), (&admin, true)] {
            let result = access
                .authorize_target(user, Operation::ViewReport, Target::Report(&report))
                .await;
            assert_eq!(result.is_ok(), visible);
        }
    }
}
