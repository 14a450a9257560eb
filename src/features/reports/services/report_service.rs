use std::sync::Arc;

use uuid::Uuid;

use super::access_control::{AccessControl, Operation, Target};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::reports::dtos::{
    AssignmentResponseDto, HistoryEntryResponseDto, ReportResponseDto,
};
use crate::features::reports::models::{Report, ReportStatus};
use crate::features::reports::repository::{LifecycleRepository, ReportFilter};
use crate::shared::types::PaginationQuery;

/// Read paths over reports, their ledger and assignments
pub struct ReportService {
    repo: Arc<dyn LifecycleRepository>,
    access: AccessControl,
}

impl ReportService {
    pub fn new(repo: Arc<dyn LifecycleRepository>) -> Self {
        Self {
            access: AccessControl::new(repo.clone()),
            repo,
        }
    }

    /// Load a report the caller is allowed to see
    async fn visible_report(&self, user: &AuthenticatedUser, report_id: Uuid) -> Result<Report> {
        let report = self
            .repo
            .find_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;

        self.access
            .authorize_target(user, Operation::ViewReport, Target::Report(&report))
            .await?;

        Ok(report)
    }

    pub async fn get_report(
        &self,
        user: &AuthenticatedUser,
        report_id: Uuid,
    ) -> Result<ReportResponseDto> {
        Ok(self.visible_report(user, report_id).await?.into())
    }

    /// Ledger of a report, oldest first
    pub async fn get_history(
        &self,
        user: &AuthenticatedUser,
        report_id: Uuid,
    ) -> Result<Vec<HistoryEntryResponseDto>> {
        let report = self.visible_report(user, report_id).await?;
        let entries = self.repo.history_for_report(report.id).await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    pub async fn my_reports(&self, user: &AuthenticatedUser) -> Result<Vec<ReportResponseDto>> {
        let reports = self.repo.reports_by_submitter(user.user_id).await?;
        Ok(reports.into_iter().map(Into::into).collect())
    }

    /// All reports for admins, newest first, with the unpaged total
    pub async fn all_reports(
        &self,
        user: &AuthenticatedUser,
        status: Option<ReportStatus>,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ReportResponseDto>, i64)> {
        self.access.authorize(user, Operation::ListAllReports)?;

        let filter = ReportFilter {
            status,
            limit: pagination.limit(),
            offset: pagination.offset(),
        };
        let (reports, total) = self.repo.list_reports(&filter).await?;
        Ok((reports.into_iter().map(Into::into).collect(), total))
    }

    /// The live assignment of a report, else its most recent one
    pub async fn assignment_for_report(
        &self,
        user: &AuthenticatedUser,
        report_id: Uuid,
    ) -> Result<AssignmentResponseDto> {
        let report = self.visible_report(user, report_id).await?;

        let assignment = match self.repo.live_assignment(report.id).await? {
            Some(live) => Some(live),
            None => self.repo.latest_assignment(report.id).await?,
        };

        assignment
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("No assignment found for this report".to_string()))
    }
}
