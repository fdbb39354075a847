//! Users repository for database operations

use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::user::{CreateUser, Role, UpdateProfile, UpdateUser, User, UserQuery, UserRow},
};

const USER_COLUMNS: &str = "id, email, display_name, password, role, avatar_url, \
                            department, course, semester, fines, created_at, updated_at";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::not_found(ErrorCode::NoSuchUser, format!("User with id {} not found", id))
        })?;

        Ok(row.into())
    }

    /// Get user by email (identity key); None when no profile exists yet
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Check whether an email is already registered, optionally excluding a user
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id != $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Search users with optional filters and pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let role = query.role.map(|r| r.as_str().to_string());

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE ($1::text IS NULL OR display_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR email ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR role = $3)
            ORDER BY display_name NULLS LAST, email
            LIMIT $4 OFFSET $5
            "#,
            USER_COLUMNS
        ))
        .bind(&query.name)
        .bind(&query.email)
        .bind(&role)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::text IS NULL OR display_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR email ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR role = $3)
            "#,
        )
        .bind(&query.name)
        .bind(&query.email)
        .bind(&role)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Create a new user profile
    pub async fn create(
        &self,
        user: &CreateUser,
        role: Role,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, display_name, password, role, avatar_url,
                               department, course, semester, fines)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&password_hash)
        .bind(role)
        .bind(&user.avatar_url)
        .bind(&user.department)
        .bind(&user.course)
        .bind(user.semester)
        .bind(Decimal::ZERO)
        .fetch_one(&self.pool)
        .await
        // The unique index on LOWER(email) closes the race between the
        // pre-insert existence check and a concurrent registration
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email is already registered".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(row.into())
    }

    /// Update a user (staff edit); absent fields are left unchanged
    pub async fn update(
        &self,
        id: i32,
        user: &UpdateUser,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                display_name = COALESCE($3, display_name),
                password = COALESCE($4, password),
                avatar_url = COALESCE($5, avatar_url),
                department = COALESCE($6, department),
                course = COALESCE($7, course),
                semester = COALESCE($8, semester),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&password_hash)
        .bind(&user.avatar_url)
        .bind(&user.department)
        .bind(&user.course)
        .bind(user.semester)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::not_found(ErrorCode::NoSuchUser, format!("User with id {} not found", id))
        })?;

        Ok(row.into())
    }

    /// Update a user's own profile fields
    pub async fn update_profile(
        &self,
        id: i32,
        profile: &UpdateProfile,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                display_name = COALESCE($2, display_name),
                avatar_url = COALESCE($3, avatar_url),
                department = COALESCE($4, department),
                course = COALESCE($5, course),
                semester = COALESCE($6, semester),
                password = COALESCE($7, password),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(&profile.department)
        .bind(&profile.course)
        .bind(profile.semester)
        .bind(&password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::not_found(ErrorCode::NoSuchUser, format!("User with id {} not found", id))
        })?;

        Ok(row.into())
    }

    /// Update a user's role (admin action)
    pub async fn update_role(&self, id: i32, role: Role) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::not_found(ErrorCode::NoSuchUser, format!("User with id {} not found", id))
        })?;

        Ok(row.into())
    }

    /// Delete a user (explicit admin action). Refused while the user still
    /// has open borrows unless forced.
    pub async fn delete(&self, id: i32, force: bool) -> AppResult<()> {
        if !force {
            let open: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM borrows WHERE user_id = $1 AND return_date IS NULL",
            )
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

            if open > 0 {
                return Err(AppError::Conflict(format!(
                    "User has {} open borrows",
                    open
                )));
            }
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                ErrorCode::NoSuchUser,
                format!("User with id {} not found", id),
            ));
        }

        Ok(())
    }

    /// Count all users
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
