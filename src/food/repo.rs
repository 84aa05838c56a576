use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::gemini::types::FoodFields;
use crate::media::{self, Media, MediaParent};

#[derive(Debug, Clone, FromRow)]
pub struct FoodAnalysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: Option<String>,
    pub carbs_gram: Option<f64>,
    pub sugar_gram: Option<f64>,
    pub advice: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Persists one food analysis plus its image attachment in one transaction.
pub async fn insert_with_media(
    db: &PgPool,
    user_id: Uuid,
    food: &FoodFields,
    media_url: &str,
) -> anyhow::Result<FoodAnalysis> {
    let mut tx = db.begin().await?;
    let analysis = sqlx::query_as::<_, FoodAnalysis>(
        r#"
        INSERT INTO food_analyses (user_id, food_name, carbs_gram, sugar_gram, advice)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, food_name, carbs_gram, sugar_gram, advice, created_at
        "#,
    )
    .bind(user_id)
    .bind(&food.food_name)
    .bind(food.estimated_carbs)
    .bind(food.estimated_glucose)
    .bind(&food.recommendation)
    .fetch_one(&mut *tx)
    .await?;
    media::insert_tx(&mut tx, MediaParent::FoodAnalysis(analysis.id), media_url).await?;
    tx.commit().await?;
    Ok(analysis)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<Vec<(FoodAnalysis, Vec<Media>)>> {
    let analyses = sqlx::query_as::<_, FoodAnalysis>(
        r#"
        SELECT id, user_id, food_name, carbs_gram, sugar_gram, advice, created_at
        FROM food_analyses
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let ids: Vec<Uuid> = analyses.iter().map(|a| a.id).collect();
    let mut media_by_parent = std::collections::HashMap::<Uuid, Vec<Media>>::new();
    for (parent_id, m) in media::list_for_parents(db, "food_analysis_id", &ids).await? {
        media_by_parent.entry(parent_id).or_default().push(m);
    }

    Ok(analyses
        .into_iter()
        .map(|a| {
            let media = media_by_parent.remove(&a.id).unwrap_or_default();
            (a, media)
        })
        .collect())
}

pub async fn count_since(
    db: &PgPool,
    user_id: Uuid,
    since: Option<OffsetDateTime>,
) -> anyhow::Result<i64> {
    let (count,) = sqlx::query_as::<_, (i64,)>(
        r#"
        SELECT COUNT(*)
        FROM food_analyses
        WHERE user_id = $1 AND ($2::timestamptz IS NULL OR created_at >= $2)
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(db)
    .await?;
    Ok(count)
}
