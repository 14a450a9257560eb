pub mod dtos;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;
pub mod routes;
pub mod services;

pub use repository::PgLifecycleStore;
pub use services::{LifecycleService, ReportService};
