pub mod analytics;
pub mod auth;
pub mod categories;
pub mod departments;
pub mod notifications;
pub mod reports;
pub mod users;
