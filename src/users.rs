use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub line_user_id: String,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Idempotent create-if-absent keyed by the platform user id. Existing
    /// rows are never modified; the no-op DO UPDATE only makes RETURNING
    /// yield the existing row.
    pub async fn upsert_by_line_id(db: &PgPool, line_user_id: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (line_user_id)
            VALUES ($1)
            ON CONFLICT (line_user_id) DO UPDATE SET line_user_id = EXCLUDED.line_user_id
            RETURNING id, line_user_id, created_at
            "#,
        )
        .bind(line_user_id)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_line_id(db: &PgPool, line_user_id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, line_user_id, created_at
            FROM users
            WHERE line_user_id = $1
            "#,
        )
        .bind(line_user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Glucose target band, falling back to the clinical defaults when the
    /// user has no settings row.
    pub async fn glucose_targets(db: &PgPool, user_id: Uuid) -> anyhow::Result<(i32, i32)> {
        let row = sqlx::query_as::<_, (i32, i32)>(
            r#"
            SELECT target_min, target_max
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row.unwrap_or((80, 180)))
    }
}
