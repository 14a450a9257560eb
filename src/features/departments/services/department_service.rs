use sqlx::PgPool;

use crate::core::database::handle_write_error;
use crate::core::error::{AppError, Result};
use crate::features::departments::dtos::{CreateDepartmentDto, DepartmentResponseDto};
use crate::features::departments::models::Department;

pub struct DepartmentService {
    pool: PgPool,
}

impl DepartmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<DepartmentResponseDto>> {
        let departments = sqlx::query_as::<_, Department>(
            r#"
            SELECT id, admin_user_id, name, description, contact_info, created_at, updated_at
            FROM departments
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list departments: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(departments.into_iter().map(Into::into).collect())
    }

    pub async fn create(&self, dto: CreateDepartmentDto) -> Result<DepartmentResponseDto> {
        let name = dto.name.trim().to_lowercase();
        let admin_user_id = match dto.admin_user_id {
            Some(id) if !name.is_empty() => id,
            _ => {
                return Err(AppError::Validation(
                    "Department name and admin user ID are required".to_string(),
                ))
            }
        };

        let admin_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(admin_user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to check department admin: {:?}", e);
                    AppError::Database(e)
                })?;
        if !admin_exists {
            return Err(AppError::NotFound("Admin user not found".to_string()));
        }

        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (admin_user_id, name, description, contact_info)
            VALUES ($1, $2, $3, $4)
            RETURNING id, admin_user_id, name, description, contact_info, created_at, updated_at
            "#,
        )
        .bind(admin_user_id)
        .bind(&name)
        .bind(&dto.description)
        .bind(&dto.contact_info)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            handle_write_error(
                e,
                "create department",
                "Department with this name already exists",
            )
        })?;

        tracing::info!(department_id = %department.id, admin = %admin_user_id, "Department created");
        Ok(department.into())
    }
}
