use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::reports::handlers::{self, ReportState};

/// Report lifecycle routes. All of them require authentication; role and
/// ownership checks happen in the services.
pub fn routes(state: ReportState) -> Router {
    Router::new()
        .route(
            "/api/reports",
            post(handlers::submit_report).get(handlers::list_reports),
        )
        .route("/api/reports/me", get(handlers::get_my_reports))
        .route("/api/reports/{report_id}", get(handlers::get_report))
        .route(
            "/api/reports/{report_id}/history",
            get(handlers::get_report_history),
        )
        .route(
            "/api/reports/{report_id}/assignment",
            get(handlers::get_report_assignment),
        )
        .route(
            "/api/admin/reports/{report_id}/assign",
            post(handlers::assign_report),
        )
        .route(
            "/api/admin/reports/{report_id}/status",
            patch(handlers::change_report_status),
        )
        .route(
            "/api/admin/reports/{report_id}/resolve",
            post(handlers::resolve_report),
        )
        .route(
            "/api/assignments/{assignment_id}/status",
            patch(handlers::update_assignment_status),
        )
        .with_state(state)
}
