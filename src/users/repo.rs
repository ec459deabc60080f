use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. The database owns `id` and both timestamps:
/// inserts rely on column defaults and updates set `updated_at` in SQL.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>, // soft-delete marker, not exposed in JSON
}

impl User {
    /// All active users, oldest first.
    pub async fn list_active(db: &PgPool) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, created_at, updated_at, deleted_at
            FROM users
            WHERE deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Find an active user by id.
    pub async fn find_active(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Whether an active user already holds this username. Soft-deleted
    /// rows do not count; their usernames are reusable.
    pub async fn username_taken(db: &PgPool, username: &str) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users WHERE username = $1 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(username)
        .fetch_one(db)
        .await
    }

    /// Whether an active user already holds this email.
    pub async fn email_taken(db: &PgPool, email: &str) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(email)
        .fetch_one(db)
        .await
    }

    /// Insert a new user. Id and timestamps come from column defaults, so a
    /// fresh row has `created_at == updated_at`.
    pub async fn create(db: &PgPool, username: &str, email: &str) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email, created_at, updated_at, deleted_at
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(db)
        .await
    }

    /// Write the (possibly unchanged) username and refresh `updated_at`.
    /// Returns None if the row is gone or soft-deleted.
    pub async fn save_username(
        db: &PgPool,
        id: Uuid,
        username: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, username, email, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(username)
        .fetch_optional(db)
        .await
    }

    /// Soft-delete an active user. Returns false when no active row matched.
    pub async fn soft_delete(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
