//! JWT payload decoding and expiry checks.
//!
//! Tokens are never verified here; the service under test does that. We only
//! need the `exp` claim to decide whether a persona's credential must be
//! refreshed before a test runs.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::TokenError;

/// Minutes before expiry at which a token counts as expiring soon.
pub const DEFAULT_BUFFER_MINUTES: i64 = 5;

const BEARER_PREFIX: &str = "Bearer";

/// URL-safe alphabet, padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(default)]
    pub iat: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Expiry as a timestamp. A zero `exp` is treated as absent.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.exp.filter(|e| *e != 0.0 && e.is_finite())?;
        Utc.timestamp_millis_opt((exp * 1000.0) as i64).single()
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        let iat = self.iat.filter(|i| i.is_finite())?;
        Utc.timestamp_millis_opt((iat * 1000.0) as i64).single()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenExpiry {
    pub is_expired: bool,
    pub is_expiring_soon: bool,
    pub expires_at: DateTime<Utc>,
    pub time_remaining: Duration,
}

impl TokenExpiry {
    /// Expired or inside the buffer window
    pub fn needs_refresh(&self) -> bool {
        self.is_expired || self.is_expiring_soon
    }

    /// Remaining minutes, clamped at zero (for display)
    pub fn minutes_remaining(&self) -> f64 {
        (self.time_remaining.num_milliseconds() as f64 / 1000.0 / 60.0).max(0.0)
    }
}

/// Remove a leading `Bearer ` (any case, any whitespace run) if present.
pub fn strip_bearer(token: &str) -> &str {
    if let Some(head) = token.get(..BEARER_PREFIX.len()) {
        if head.eq_ignore_ascii_case(BEARER_PREFIX) {
            let rest = &token[BEARER_PREFIX.len()..];
            let trimmed = rest.trim_start();
            if trimmed.len() < rest.len() {
                return trimmed;
            }
        }
    }
    token
}

/// Format a raw cookie value as an Authorization-style token.
pub fn bearer(raw: &str) -> String {
    format!("{} {}", BEARER_PREFIX, strip_bearer(raw))
}

/// Decode the payload segment of a JWT.
///
/// Returns `None` for anything that is not three dot-separated segments with a
/// base64 JSON object in the middle. Never panics.
pub fn decode(token: &str) -> Option<Claims> {
    let clean = strip_bearer(token);
    let mut parts = clean.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    // Tolerate the standard alphabet too
    let normalized: String = payload
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE.decode(normalized.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Check expiry against the current wall clock.
pub fn check_expiry(token: &str, buffer: Duration) -> Result<TokenExpiry, TokenError> {
    check_expiry_at(token, buffer, Utc::now())
}

/// Check expiry against an explicit `now`.
pub fn check_expiry_at(
    token: &str,
    buffer: Duration,
    now: DateTime<Utc>,
) -> Result<TokenExpiry, TokenError> {
    let expires_at = decode(token)
        .and_then(|claims| claims.expires_at())
        .ok_or(TokenError::InvalidToken)?;

    let time_remaining = expires_at - now;
    let is_expired = time_remaining <= Duration::zero();

    Ok(TokenExpiry {
        is_expired,
        is_expiring_soon: !is_expired && time_remaining <= buffer,
        expires_at,
        time_remaining,
    })
}

/// Build an unsigned token carrying `claims`.
///
/// Used by fixtures and tests that need a structurally valid JWT without a
/// real identity provider. The signature segment is a placeholder.
pub fn mint_unsigned(claims: &serde_json::Value) -> String {
    let header = PAYLOAD_ENGINE.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = PAYLOAD_ENGINE.encode(claims.to_string().as_bytes());
    format!("{}.{}.unsigned", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_expiring_in(seconds: i64) -> String {
        let exp = Utc::now().timestamp() + seconds;
        bearer(&mint_unsigned(&json!({ "exp": exp, "iat": exp - 900, "org_id": "13476" })))
    }

    fn buffer() -> Duration {
        Duration::minutes(DEFAULT_BUFFER_MINUTES)
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(strip_bearer("bearer   abc"), "abc");
        assert_eq!(strip_bearer("BEARER\tabc"), "abc");
        assert_eq!(strip_bearer("Bearerabc"), "Bearerabc");
        assert_eq!(strip_bearer("abc"), "abc");
        assert_eq!(strip_bearer("é"), "é");
    }

    #[test]
    fn test_bearer_does_not_double_prefix() {
        assert_eq!(bearer("abc"), "Bearer abc");
        assert_eq!(bearer("Bearer abc"), "Bearer abc");
    }

    #[test]
    fn test_decode_valid_token() {
        let token = mint_unsigned(&json!({ "exp": 1700000000, "iat": 1699999000, "sub": "admin" }));
        let claims = decode(&token).expect("token should decode");
        assert_eq!(claims.exp, Some(1700000000.0));
        assert_eq!(claims.iat, Some(1699999000.0));
        assert_eq!(claims.extra.get("sub"), Some(&json!("admin")));

        // Same result with the prefix
        assert_eq!(decode(&format!("Bearer {}", token)), Some(claims));
    }

    #[test]
    fn test_decode_accepts_padded_and_standard_alphabet() {
        use base64::engine::general_purpose::STANDARD;
        // Node-style payloads: standard alphabet, padded
        let payload = STANDARD.encode(br#"{"exp":1700000000,"note":"?>?>"}"#);
        let claims = decode(&format!("h.{}.s", payload)).expect("padded standard payload");
        assert_eq!(claims.exp, Some(1700000000.0));
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        assert_eq!(decode("not-a-jwt"), None);
        assert_eq!(decode("only.two"), None);
        assert_eq!(decode("a.b.c.d"), None);
        assert_eq!(decode(""), None);
        assert_eq!(decode("h.!!!!.s"), None);
        // Valid base64 but not JSON
        let not_json = PAYLOAD_ENGINE.encode(b"plain text");
        assert_eq!(decode(&format!("h.{}.s", not_json)), None);
        // JSON but not an object
        let array = PAYLOAD_ENGINE.encode(b"[1,2,3]");
        assert_eq!(decode(&format!("h.{}.s", array)), None);
    }

    #[test]
    fn test_check_expiry_expired() {
        let expiry = check_expiry(&token_expiring_in(-60), buffer()).expect("valid token");
        assert!(expiry.is_expired);
        assert!(!expiry.is_expiring_soon);
        assert!(expiry.needs_refresh());
        assert_eq!(expiry.minutes_remaining(), 0.0);
    }

    #[test]
    fn test_check_expiry_expiring_soon() {
        let expiry = check_expiry(&token_expiring_in(120), buffer()).expect("valid token");
        assert!(!expiry.is_expired);
        assert!(expiry.is_expiring_soon);
        assert!(expiry.needs_refresh());
    }

    #[test]
    fn test_check_expiry_fresh() {
        let expiry = check_expiry(&token_expiring_in(3600), buffer()).expect("valid token");
        assert!(!expiry.is_expired);
        assert!(!expiry.is_expiring_soon);
        assert!(!expiry.needs_refresh());
        assert!(expiry.minutes_remaining() > 59.0);
    }

    #[test]
    fn test_check_expiry_boundaries() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp");
        let token = mint_unsigned(&json!({ "exp": 1_700_000_000 + 300 }));

        // Exactly at the buffer edge counts as expiring soon
        let at_edge = check_expiry_at(&token, Duration::minutes(5), now).expect("valid token");
        assert!(at_edge.is_expiring_soon);

        // Exactly at exp counts as expired
        let at_exp = check_expiry_at(&token, Duration::minutes(5), now + Duration::seconds(300))
            .expect("valid token");
        assert!(at_exp.is_expired);
        assert!(!at_exp.is_expiring_soon);
    }

    #[test]
    fn test_check_expiry_errors() {
        assert_eq!(check_expiry("not-a-jwt", buffer()), Err(TokenError::InvalidToken));

        let no_exp = mint_unsigned(&json!({ "iat": 1699999000 }));
        assert_eq!(check_expiry(&no_exp, buffer()), Err(TokenError::InvalidToken));

        let zero_exp = mint_unsigned(&json!({ "exp": 0 }));
        assert_eq!(check_expiry(&zero_exp, buffer()), Err(TokenError::InvalidToken));
    }
}
