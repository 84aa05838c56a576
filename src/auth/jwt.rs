use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::config::JwtConfig;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct AppClaims {
    /// Platform user id the token was issued for.
    pub sub: String,
    pub display_name: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

pub fn sign_app_token(
    cfg: &JwtConfig,
    line_user_id: &str,
    display_name: Option<&str>,
) -> anyhow::Result<String> {
    let now = OffsetDateTime::now_utc();
    let exp = now + time::Duration::days(cfg.ttl_days);
    let claims = AppClaims {
        sub: line_user_id.to_string(),
        display_name: display_name.map(|s| s.to_string()),
        iat: now.unix_timestamp() as usize,
        exp: exp.unix_timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_app_token(cfg: &JwtConfig, token: &str) -> anyhow::Result<AppClaims> {
    let data = decode::<AppClaims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Extracts the authenticated LINE user id from a Bearer app token.
pub struct AuthUser(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            ))?;

        match verify_app_token(&state.config.jwt, token) {
            Ok(claims) => Ok(AuthUser(claims.sub)),
            Err(e) => {
                warn!(error = %e, "invalid or expired app token");
                Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> JwtConfig {
        JwtConfig {
            secret: "dev-secret".into(),
            ttl_days: 7,
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let token = sign_app_token(&cfg(), "U123", Some("สมหญิง")).unwrap();
        let claims = verify_app_token(&cfg(), &token).unwrap();
        assert_eq!(claims.sub, "U123");
        assert_eq!(claims.display_name.as_deref(), Some("สมหญิง"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = sign_app_token(&cfg(), "U123", None).unwrap();
        let other = JwtConfig {
            secret: "other-secret".into(),
            ttl_days: 7,
        };
        assert!(verify_app_token(&other, &token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(verify_app_token(&cfg(), "not-a-token").is_err());
    }
}
