use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{error, instrument};

use super::dto::{LabItem, LabPage};
use super::repo;
use crate::auth::jwt::AuthUser;
use crate::state::AppState;
use crate::users::User;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct LabQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn page_window(query: &LabQuery) -> (i64, i64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit, (page - 1) * limit)
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
    Query(query): Query<LabQuery>,
) -> Result<Json<LabPage>, (StatusCode, String)> {
    let user = User::find_by_line_id(&state.db, &line_user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let (page, limit, offset) = page_window(&query);
    let kind = query.kind.as_deref();

    let rows = repo::list_by_user(&state.db, user.id, kind, limit, offset)
        .await
        .map_err(internal)?;
    let total = repo::count_by_user(&state.db, user.id, kind)
        .await
        .map_err(internal)?;
    let available_types = repo::distinct_types(&state.db, user.id)
        .await
        .map_err(internal)?;

    let items = rows
        .into_iter()
        .map(|(result, media)| LabItem::from_row(result, media))
        .collect();

    Ok(Json(LabPage {
        items,
        total,
        page,
        limit,
        available_types,
    }))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "lab handler failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_defaults_and_clamps() {
        let (page, limit, offset) = page_window(&LabQuery::default());
        assert_eq!((page, limit, offset), (1, DEFAULT_LIMIT, 0));

        let q = LabQuery {
            page: Some(3),
            limit: Some(10),
            kind: None,
        };
        assert_eq!(page_window(&q), (3, 10, 20));

        let q = LabQuery {
            page: Some(0),
            limit: Some(1000),
            kind: None,
        };
        assert_eq!(page_window(&q), (1, MAX_LIMIT, 0));
    }
}
