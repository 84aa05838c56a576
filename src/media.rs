use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Opaque attachment record. Each row belongs to exactly one parent; the
/// same URL appearing on two rows is two attachments, never shared ownership.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Media {
    pub id: Uuid,
    pub url: String,
}

/// Parent column a media row hangs off.
#[derive(Debug, Clone, Copy)]
pub enum MediaParent {
    FoodAnalysis(Uuid),
    LabResult(Uuid),
    Appointment(Uuid),
}

impl MediaParent {
    fn column(&self) -> &'static str {
        match self {
            MediaParent::FoodAnalysis(_) => "food_analysis_id",
            MediaParent::LabResult(_) => "lab_result_id",
            MediaParent::Appointment(_) => "appointment_id",
        }
    }

    fn id(&self) -> Uuid {
        match self {
            MediaParent::FoodAnalysis(id)
            | MediaParent::LabResult(id)
            | MediaParent::Appointment(id) => *id,
        }
    }
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    parent: MediaParent,
    url: &str,
) -> anyhow::Result<Media> {
    let sql = format!(
        "INSERT INTO media (url, {}) VALUES ($1, $2) RETURNING id, url",
        parent.column()
    );
    let media = sqlx::query_as::<_, Media>(&sql)
        .bind(url)
        .bind(parent.id())
        .fetch_one(&mut **tx)
        .await?;
    Ok(media)
}

/// Media rows for a batch of parent ids, returned as (parent_id, media).
pub async fn list_for_parents(
    db: &PgPool,
    column: &'static str,
    parent_ids: &[Uuid],
) -> anyhow::Result<Vec<(Uuid, Media)>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {column} AS parent_id, id, url FROM media WHERE {column} = ANY($1) ORDER BY created_at"
    );
    let rows = sqlx::query_as::<_, (Uuid, Uuid, String)>(&sql)
        .bind(parent_ids)
        .fetch_all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(parent_id, id, url)| (parent_id, Media { id, url }))
        .collect())
}
