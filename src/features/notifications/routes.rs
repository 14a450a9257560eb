use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::features::notifications::handlers;
use crate::features::notifications::services::NotificationService;

pub fn routes(service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/notifications", get(handlers::get_my_notifications))
        .route(
            "/api/notifications/{notification_id}/read",
            patch(handlers::mark_notification_as_read),
        )
        .with_state(service)
}
