use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::handle_write_error;
use crate::core::error::{AppError, Result};
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::models::{CreateUser, User, UserRole};
use crate::shared::types::PaginationQuery;

const USER_COLUMNS: &str = "id, username, name, email, password_hash, role, phone_number, \
     refresh_token_hash, created_at, updated_at";

/// Identity store backed by the `users` table
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user by id: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Look a user up by email or username (both stored lowercase)
    pub async fn find_by_login(&self, identifier: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $1 LIMIT 1",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(identifier.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user by login: {:?}", e);
                AppError::Database(e)
            })
    }

    pub async fn create(&self, data: CreateUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, name, email, password_hash, role, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&data.username)
            .bind(&data.name)
            .bind(&data.email)
            .bind(&data.password_hash)
            .bind(data.role)
            .bind(&data.phone_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                handle_write_error(
                    e,
                    "create user",
                    "User with this email or username already exists",
                )
            })
    }

    /// Store (or clear) the fingerprint of the user's current refresh token
    pub async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update refresh token: {:?}", e);
                AppError::Database(e)
            })?;
        Ok(())
    }

    pub async fn list(&self, page: &PaginationQuery) -> Result<(Vec<UserResponseDto>, i64)> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list users: {:?}", e);
                AppError::Database(e)
            })?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count users: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((users.into_iter().map(Into::into).collect(), total))
    }

    pub async fn update_role(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<UserResponseDto> {
        ensure_not_self(actor_id, user_id)?;

        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update user role: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = %user_id, role = %role, actor = %actor_id, "User role updated");
        Ok(user.into())
    }
}

/// Admins cannot change their own role
fn ensure_not_self(actor_id: Uuid, user_id: Uuid) -> Result<()> {
    if actor_id == user_id {
        return Err(AppError::Validation(
            "You cannot change your own role".to_string(),
        ));
    }
    Ok(())
}
