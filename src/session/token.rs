//! Client-side JWT expiry inspection.
//!
//! The claims are decoded without verifying the signature: the token was
//! issued by the backend we are about to present it to, so its `exp`
//! claim is trusted for UX decisions only (refresh before it lapses),
//! never for authorization.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Expiry instant encoded in the token's claims, if it can be read.
pub fn expiry(token: &str) -> Option<DateTime<Utc>> {
    let claims_segment = token.split('.').nth(1)?;
    let raw = URL_SAFE_NO_PAD.decode(claims_segment).ok()?;
    let claims: ExpiryClaim = serde_json::from_slice(&raw).ok()?;
    Utc.timestamp_opt(claims.exp, 0).single()
}

/// Whether the token is expired (or will be within `leeway_secs`).
///
/// Fails safe: a token whose claims cannot be decoded is treated as
/// expired, forcing a refresh rather than a doomed request.
pub fn is_expired(token: &str, leeway_secs: i64) -> bool {
    match expiry(token) {
        Some(exp) => Utc::now().timestamp() + leeway_secs >= exp.timestamp(),
        None => true,
    }
}

#[cfg(test)]
pub(crate) fn make_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
    format!("{header}.{claims}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_future_expiry_is_not_expired() {
        let token = make_token(Utc::now().timestamp() + 3600);
        assert!(!is_expired(&token, 30));
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let token = make_token(Utc::now().timestamp() - 10);
        assert!(is_expired(&token, 30));
    }

    #[test]
    fn test_leeway_counts_as_expired() {
        let token = make_token(Utc::now().timestamp() + 10);
        assert!(is_expired(&token, 30));
    }

    #[test]
    fn test_unparseable_token_fails_safe() {
        assert!(is_expired("garbage", 0));
        assert!(is_expired("a.b.c", 0));
        assert!(is_expired("", 0));
        // Valid base64 but not JSON claims.
        let bogus = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        assert!(is_expired(&bogus, 0));
    }

    #[test]
    fn test_expiry_decodes_claim() {
        let ts = 2_000_000_000;
        let token = make_token(ts);
        assert_eq!(expiry(&token).unwrap().timestamp(), ts);
    }
}
