//! Compact HMAC-SHA256 signed bearer tokens shared by both services.
//!
//! The validator is pure: no I/O, no clock source beyond what is passed in by
//! the caller for testability. Signature verification uses a constant-time
//! comparison (`subtle`) so timing does not leak which byte first diverged.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("TOKEN_INVALID")]
    Invalid,
    #[error("TOKEN_EXPIRED")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            alg: "HS256",
            typ: "JWT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    nbf: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    roles: Vec<String>,
}

/// Identity extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Signs a new token for `subject` with the given `roles`, expiring `ttl_seconds`
/// from now. Exposed for tests and for tooling that seeds principals out of band
/// (credential-to-token exchange itself is out of scope per `spec.md` §1).
pub fn issue(secret: &[u8], subject: &str, roles: &[String], ttl_seconds: i64) -> String {
    let now = now_unix();
    issue_at(secret, subject, roles, now, now + ttl_seconds)
}

fn issue_at(secret: &[u8], subject: &str, roles: &[String], nbf: i64, exp: i64) -> String {
    let header = Header::default();
    let claims = Claims {
        sub: subject.to_string(),
        exp,
        nbf,
        roles: roles.to_vec(),
    };

    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).expect("header is always serializable"));
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("claims are always serializable"));
    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature = sign(secret, signing_input.as_bytes());

    format!("{signing_input}.{signature}")
}

fn sign(secret: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts a key of any size");
    mac.update(message);
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Validates a bearer token string against `secret`, checking signature, `nbf`
/// and `exp` against `now`. Performs no I/O.
pub fn validate(secret: &[u8], bearer: &str, now: i64) -> Result<Principal, TokenError> {
    let mut parts = bearer.splitn(3, '.');
    let header_b64 = parts.next().ok_or(TokenError::Invalid)?;
    let claims_b64 = parts.next().ok_or(TokenError::Invalid)?;
    let signature_b64 = parts.next().ok_or(TokenError::Invalid)?;
    if parts.next().is_some() {
        return Err(TokenError::Invalid);
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let expected = sign(secret, signing_input.as_bytes());
    if expected.as_bytes().ct_eq(signature_b64.as_bytes()).unwrap_u8() != 1 {
        return Err(TokenError::Invalid);
    }

    let claims_raw = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| TokenError::Invalid)?;
    let claims: Claims = serde_json::from_slice(&claims_raw).map_err(|_| TokenError::Invalid)?;

    if now < claims.nbf {
        return Err(TokenError::Invalid);
    }
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(Principal {
        subject: claims.sub,
        roles: claims.roles,
    })
}

/// Convenience wrapper using the wall clock.
pub fn validate_now(secret: &[u8], bearer: &str) -> Result<Principal, TokenError> {
    validate(secret, bearer, now_unix())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-shared-secret";

    #[test]
    fn round_trips_a_valid_token() {
        let token = issue(SECRET, "user-1", &["ADMIN".to_string()], 60);
        let principal = validate_now(SECRET, &token).unwrap();
        assert_eq!(principal.subject, "user-1");
        assert!(principal.has_role("ADMIN"));
    }

    #[test]
    fn rejects_bad_signature() {
        let token = issue(SECRET, "user-1", &[], 60);
        let tampered = format!("{}x", token);
        assert_eq!(validate_now(SECRET, &tampered).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn rejects_expired_token() {
        let token = issue_at(SECRET, "user-1", &[], 0, 100);
        assert_eq!(validate(SECRET, &token, 200).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn rejects_not_yet_valid_token() {
        let token = issue_at(SECRET, "user-1", &[], 500, 600);
        assert_eq!(validate(SECRET, &token, 100).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn rejects_malformed_token() {
        assert_eq!(validate_now(SECRET, "not-a-token").unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn different_secret_is_rejected() {
        let token = issue(SECRET, "user-1", &[], 60);
        assert_eq!(
            validate_now(b"different-secret", &token).unwrap_err(),
            TokenError::Invalid
        );
    }
}
