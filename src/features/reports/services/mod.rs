pub mod access_control;
mod lifecycle_service;
mod report_service;

pub use lifecycle_service::LifecycleService;
pub use report_service::ReportService;
