use crate::features::users::handlers;
use crate::features::users::services::UserService;
use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

/// User management routes (super admin only, auth middleware applied by caller)
pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/admin/users", get(handlers::list_users))
        .route("/api/admin/users/{user_id}/role", put(handlers::update_user_role))
        .with_state(service)
}
