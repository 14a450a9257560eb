use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::departments::handlers;
use crate::features::departments::services::DepartmentService;

pub fn public_routes(service: Arc<DepartmentService>) -> Router {
    Router::new()
        .route("/api/departments", get(handlers::list_departments))
        .with_state(service)
}

pub fn protected_routes(service: Arc<DepartmentService>) -> Router {
    Router::new()
        .route("/api/departments", post(handlers::create_department))
        .with_state(service)
}
