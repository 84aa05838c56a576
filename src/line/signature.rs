use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the `x-line-signature` header: base64(HMAC-SHA256(secret, body))
/// over the exact raw request body.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let digest = BASE64.encode(mac.finalize().into_bytes());
    digest == signature
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64(hmac_sha256("test-channel-secret", body)) computed offline
    const BODY: &[u8] = br#"{"destination":"U0","events":[]}"#;
    const SECRET: &str = "test-channel-secret";
    const EXPECTED: &str = "gQe1nlhCYUjCASVA8bc80PkuRrptjwZp4BwaK3x1fFw=";

    #[test]
    fn accepts_matching_signature() {
        assert!(verify_signature(SECRET, BODY, EXPECTED));
    }

    #[test]
    fn rejects_wrong_signature_secret_or_body() {
        assert!(!verify_signature(SECRET, BODY, "bm90LXRoZS1zaWduYXR1cmU="));
        assert!(!verify_signature("other-secret", BODY, EXPECTED));
        let tampered = br#"{"destination":"U0","events":[{}]}"#;
        assert!(!verify_signature(SECRET, tampered, EXPECTED));
    }

    #[test]
    fn rejects_empty_signature() {
        assert!(!verify_signature(SECRET, BODY, ""));
    }
}
