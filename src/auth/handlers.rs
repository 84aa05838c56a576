use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use super::jwt::sign_app_token;
use super::liff::{inspect_id_token, token_expiry};
use crate::state::AppState;
use crate::users::User;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub line_user_id: String,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub jwt: String,
    pub user: UserProfile,
}

/// POST /auth/line-verify — exchanges a LIFF ID token for an app JWT,
/// lazily creating the user record on first contact.
#[instrument(skip_all)]
pub async fn line_verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, (StatusCode, String)> {
    let claims = inspect_id_token(&body.id_token, &state.config.line.channel_id).ok_or((
        StatusCode::UNAUTHORIZED,
        "Invalid or expired LINE ID token. Please login again.".to_string(),
    ))?;

    User::upsert_by_line_id(&state.db, &claims.sub)
        .await
        .map_err(|e| {
            error!(error = %e, "user upsert failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error. Please try again.".to_string(),
            )
        })?;

    let jwt = sign_app_token(&state.config.jwt, &claims.sub, claims.name.as_deref()).map_err(|e| {
        error!(error = %e, "token signing failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error. Please try again.".to_string(),
        )
    })?;

    Ok(Json(VerifyResponse {
        jwt,
        user: UserProfile {
            line_user_id: claims.sub,
            display_name: claims.name,
            picture_url: claims.picture,
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct TokenStatus {
    pub is_expired: bool,
    pub seconds_until_expiry: i64,
    pub needs_refresh: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: time::OffsetDateTime,
}

/// POST /auth/check-token — expiry info so the app knows when to re-login.
#[instrument(skip_all)]
pub async fn check_token(
    Json(body): Json<VerifyRequest>,
) -> Result<Json<TokenStatus>, (StatusCode, String)> {
    let info = token_expiry(&body.id_token)
        .ok_or((StatusCode::BAD_REQUEST, "Invalid token format".to_string()))?;
    Ok(Json(TokenStatus {
        is_expired: info.is_expired,
        seconds_until_expiry: info.seconds_until_expiry,
        needs_refresh: info.seconds_until_expiry < 300,
        expires_at: info.expires_at,
    }))
}
