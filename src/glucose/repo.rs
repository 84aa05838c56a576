use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct GlucoseLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub value: f64,
    pub period: String,
    pub note: Option<String>,
    pub recorded_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    value: f64,
    period: &str,
    recorded_at: OffsetDateTime,
) -> anyhow::Result<GlucoseLog> {
    let log = sqlx::query_as::<_, GlucoseLog>(
        r#"
        INSERT INTO glucose_logs (user_id, value, period, recorded_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, value, period, note, recorded_at
        "#,
    )
    .bind(user_id)
    .bind(value)
    .bind(period)
    .bind(recorded_at)
    .fetch_one(db)
    .await?;
    Ok(log)
}

pub async fn list_between(
    db: &PgPool,
    user_id: Uuid,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> anyhow::Result<Vec<GlucoseLog>> {
    let rows = sqlx::query_as::<_, GlucoseLog>(
        r#"
        SELECT id, user_id, value, period, note, recorded_at
        FROM glucose_logs
        WHERE user_id = $1 AND recorded_at >= $2 AND recorded_at < $3
        ORDER BY recorded_at DESC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Newest-first page of logs, optionally restricted to [start, end).
pub async fn list_page(
    db: &PgPool,
    user_id: Uuid,
    window: Option<(OffsetDateTime, OffsetDateTime)>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<GlucoseLog>> {
    let (start, end) = match window {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    };
    let rows = sqlx::query_as::<_, GlucoseLog>(
        r#"
        SELECT id, user_id, value, period, note, recorded_at
        FROM glucose_logs
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR recorded_at >= $2)
          AND ($3::timestamptz IS NULL OR recorded_at < $3)
        ORDER BY recorded_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Count, rounded average and latest timestamp over an optional [start, end)
/// window. An empty window yields (0, None, None).
pub async fn aggregate(
    db: &PgPool,
    user_id: Uuid,
    window: Option<(OffsetDateTime, OffsetDateTime)>,
) -> anyhow::Result<(i64, Option<f64>, Option<OffsetDateTime>)> {
    let (start, end) = match window {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    };
    let row = sqlx::query_as::<_, (i64, Option<f64>, Option<OffsetDateTime>)>(
        r#"
        SELECT COUNT(*), ROUND(AVG(value)::numeric)::float8, MAX(recorded_at)
        FROM glucose_logs
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR recorded_at >= $2)
          AND ($3::timestamptz IS NULL OR recorded_at < $3)
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    value: Option<f64>,
    period: Option<&str>,
    note: Option<&str>,
) -> anyhow::Result<Option<GlucoseLog>> {
    let row = sqlx::query_as::<_, GlucoseLog>(
        r#"
        UPDATE glucose_logs
        SET value  = COALESCE($3, value),
            period = COALESCE($4, period),
            note   = COALESCE($5, note)
        WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, value, period, note, recorded_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(value)
    .bind(period)
    .bind(note)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM glucose_logs WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Users with no glucose log inside [start, end), for the daily nudge.
pub async fn users_without_log_between(
    db: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> anyhow::Result<Vec<(Uuid, String)>> {
    let rows = sqlx::query_as::<_, (Uuid, String)>(
        r#"
        SELECT u.id, u.line_user_id
        FROM users u
        WHERE NOT EXISTS (
            SELECT 1 FROM glucose_logs g
            WHERE g.user_id = u.id AND g.recorded_at >= $1 AND g.recorded_at < $2
        )
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
