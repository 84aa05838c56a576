use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::line::mapper::NewLabResult;
use crate::media::{self, Media, MediaParent};

#[derive(Debug, Clone, FromRow)]
pub struct LabResult {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub unit: String,
    pub reference_range: Option<String>,
    pub test_date: Date,
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Writes every extracted row from one image in one transaction. Each row
/// gets its own media record carrying the shared upload URL.
pub async fn insert_from_image(
    db: &PgPool,
    user_id: Uuid,
    rows: &[NewLabResult],
    test_date: Date,
    media_url: &str,
) -> anyhow::Result<Vec<LabResult>> {
    let mut tx = db.begin().await?;
    let mut created = Vec::with_capacity(rows.len());
    for row in rows {
        let result = sqlx::query_as::<_, LabResult>(
            r#"
            INSERT INTO lab_results (user_id, type, value, unit, reference_range, test_date, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, type, value, unit, reference_range, test_date, note, created_at
            "#,
        )
        .bind(user_id)
        .bind(row.kind)
        .bind(row.value)
        .bind(&row.unit)
        .bind(&row.reference_range)
        .bind(test_date)
        .bind(row.note)
        .fetch_one(&mut *tx)
        .await?;
        media::insert_tx(&mut tx, MediaParent::LabResult(result.id), media_url).await?;
        created.push(result);
    }
    tx.commit().await?;
    Ok(created)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    kind: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<(LabResult, Vec<Media>)>> {
    let results = sqlx::query_as::<_, LabResult>(
        r#"
        SELECT id, user_id, type, value, unit, reference_range, test_date, note, created_at
        FROM lab_results
        WHERE user_id = $1 AND ($2::text IS NULL OR type = $2)
        ORDER BY test_date DESC, created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let ids: Vec<Uuid> = results.iter().map(|r| r.id).collect();
    let mut media_by_parent = std::collections::HashMap::<Uuid, Vec<Media>>::new();
    for (parent_id, m) in media::list_for_parents(db, "lab_result_id", &ids).await? {
        media_by_parent.entry(parent_id).or_default().push(m);
    }

    Ok(results
        .into_iter()
        .map(|r| {
            let media = media_by_parent.remove(&r.id).unwrap_or_default();
            (r, media)
        })
        .collect())
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid, kind: Option<&str>) -> anyhow::Result<i64> {
    let (count,) = sqlx::query_as::<_, (i64,)>(
        r#"
        SELECT COUNT(*)
        FROM lab_results
        WHERE user_id = $1 AND ($2::text IS NULL OR type = $2)
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .fetch_one(db)
    .await?;
    Ok(count)
}

pub async fn distinct_types(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT DISTINCT type
        FROM lab_results
        WHERE user_id = $1
        ORDER BY type
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(t,)| t).collect())
}
