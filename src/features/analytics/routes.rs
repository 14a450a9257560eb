use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::analytics::handlers;
use crate::features::analytics::services::AnalyticsService;

pub fn routes(service: Arc<AnalyticsService>) -> Router {
    Router::new()
        .route(
            "/api/analytics/dashboard",
            get(handlers::get_dashboard_summary),
        )
        .route("/api/analytics/generate", post(handlers::generate_analytics))
        .with_state(service)
}
