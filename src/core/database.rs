use crate::core::config::DatabaseConfig;
use crate::core::error::AppError;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Whether the error is a PostgreSQL unique constraint violation (23505),
/// optionally restricted to one constraint name
pub fn is_unique_violation(e: &sqlx::Error, constraint: Option<&str>) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
            return match constraint {
                Some(name) => db_err.constraint() == Some(name),
                None => true,
            };
        }
    }
    false
}

/// Convert a write error into `Conflict` for unique violations, logging everything else
pub fn handle_write_error(e: sqlx::Error, action: &str, conflict_message: &str) -> AppError {
    if is_unique_violation(&e, None) {
        return AppError::Conflict(conflict_message.to_string());
    }
    tracing::error!("Failed to {}: {:?}", action, e);
    AppError::Database(e)
}
