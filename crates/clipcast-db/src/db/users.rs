use async_trait::async_trait;
use clipcast_core::models::{Role, User};
use clipcast_core::repo::UserStore;
use clipcast_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for user accounts
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user. Fails with `Conflict` when the email is taken.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
        company_name: Option<&str>,
    ) -> Result<User, AppError> {
        // Dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role, company_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, role, company_name, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(company_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("User already exists with email {}", email))
            }
            _ => AppError::from(e),
        })?;

        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, company_name, is_active,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, company_name, is_active,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Active users with a given role among the listed emails.
    pub async fn list_active_by_emails(
        &self,
        emails: &[String],
        role: Role,
    ) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, company_name, is_active,
                   created_at, updated_at
            FROM users
            WHERE email = ANY($1) AND role = $2 AND is_active = TRUE
            "#,
        )
        .bind(emails)
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Soft-disable an account, excluding it from all new authorization.
    pub async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.get_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.get_by_email(email).await
    }
}
