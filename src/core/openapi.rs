use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::analytics::{dtos as analytics_dtos, handlers as analytics_handlers};
use crate::features::auth;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::departments::{dtos as departments_dtos, handlers as departments_handlers};
use crate::features::notifications::{
    dtos as notifications_dtos, handlers as notifications_handlers,
    models as notifications_models,
};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::refresh_token,
        auth::handlers::get_me,
        auth::handlers::logout,
        // Users (super admin)
        users_handlers::list_users,
        users_handlers::update_user_role,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::create_category,
        // Departments
        departments_handlers::list_departments,
        departments_handlers::create_department,
        // Reports
        reports_handlers::submit_report,
        reports_handlers::get_my_reports,
        reports_handlers::list_reports,
        reports_handlers::get_report,
        reports_handlers::get_report_history,
        reports_handlers::get_report_assignment,
        reports_handlers::update_assignment_status,
        // Admin reports
        reports_handlers::assign_report,
        reports_handlers::change_report_status,
        reports_handlers::resolve_report,
        // Notifications
        notifications_handlers::get_my_notifications,
        notifications_handlers::mark_notification_as_read,
        // Analytics
        analytics_handlers::get_dashboard_summary,
        analytics_handlers::generate_analytics,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::model::AuthenticatedUser,
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::RefreshTokenRequestDto,
            auth::dtos::RefreshTokenResponseDto,
            auth::dtos::AuthResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::RefreshTokenResponseDto>,
            // Users
            users_models::UserRole,
            users_dtos::UserResponseDto,
            users_dtos::UpdateUserRoleDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            // Categories
            categories_dtos::CategoryResponseDto,
            categories_dtos::CreateCategoryDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            // Departments
            departments_dtos::DepartmentResponseDto,
            departments_dtos::CreateDepartmentDto,
            ApiResponse<departments_dtos::DepartmentResponseDto>,
            ApiResponse<Vec<departments_dtos::DepartmentResponseDto>>,
            // Reports
            reports_models::ReportStatus,
            reports_models::ReportPriority,
            reports_models::AssignmentStatus,
            reports_dtos::SubmitReportForm,
            reports_dtos::ResolveReportForm,
            reports_dtos::ReportResponseDto,
            reports_dtos::AssignReportDto,
            reports_dtos::ChangeStatusDto,
            reports_dtos::UpdateAssignmentStatusDto,
            reports_dtos::AssignmentResponseDto,
            reports_dtos::HistoryEntryResponseDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            ApiResponse<reports_dtos::AssignmentResponseDto>,
            ApiResponse<Vec<reports_dtos::HistoryEntryResponseDto>>,
            // Notifications
            notifications_models::NotificationStatus,
            notifications_dtos::NotificationResponseDto,
            ApiResponse<notifications_dtos::NotificationResponseDto>,
            ApiResponse<Vec<notifications_dtos::NotificationResponseDto>>,
            // Analytics
            analytics_dtos::AnalyticsSnapshotDto,
            ApiResponse<analytics_dtos::AnalyticsSnapshotDto>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "users", description = "User administration (super admin only)"),
        (name = "categories", description = "Report categories"),
        (name = "departments", description = "Departments and their administrators"),
        (name = "reports", description = "Citizen reports, their history and assignments"),
        (name = "admin-reports", description = "Report lifecycle actions for administrators"),
        (name = "notifications", description = "Per-user lifecycle notifications"),
        (name = "analytics", description = "Derived report metrics (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Civic Report API",
        version = "0.1.0",
        description = "API documentation for the civic issue reporting service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
