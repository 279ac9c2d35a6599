//! Session cookie verification.
//!
//! Sessions are issued by the login flow as
//! `<base64url(email)>.<expiry_unix>.<hex hmac-sha256>` where the MAC covers
//! `<base64url(email)>.<expiry_unix>`. This service only verifies them;
//! [`SessionSigner::issue`] exists for the login collaborator and tests.

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;
use crate::server::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Why a session was not accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session secret must not be empty")]
    InvalidSecret,
    #[error("no session cookie")]
    Missing,
    #[error("malformed session cookie")]
    Malformed,
    #[error("session signature mismatch")]
    BadSignature,
    #[error("session expired")]
    Expired,
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub email: String,
    /// Unix seconds.
    pub expires_at: i64,
}

/// Signs and verifies session cookies.
#[derive(Clone)]
pub struct SessionSigner {
    mac: HmacSha256,
    cookie_name: String,
}

impl SessionSigner {
    pub fn new(secret: &str, cookie_name: impl Into<String>) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SessionError::InvalidSecret)?;
        Ok(Self {
            mac,
            cookie_name: cookie_name.into(),
        })
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Cookie value for `email`, valid until `expires_at` (unix seconds).
    #[must_use]
    pub fn issue(&self, email: &str, expires_at: i64) -> String {
        let payload = format!("{}.{expires_at}", URL_SAFE_NO_PAD.encode(email));
        let signature = hex::encode(self.sign(&payload));
        format!("{payload}.{signature}")
    }

    /// Verify a cookie value at `now` (unix seconds).
    pub fn verify(&self, value: &str, now: i64) -> Result<Session, SessionError> {
        let (payload, signature) = value.rsplit_once('.').ok_or(SessionError::Malformed)?;
        let (encoded_email, expiry) = payload.split_once('.').ok_or(SessionError::Malformed)?;

        let signature = hex::decode(signature).map_err(|_| SessionError::Malformed)?;
        let computed = self.sign(payload);
        if !bool::from(computed.as_slice().ct_eq(&signature)) {
            return Err(SessionError::BadSignature);
        }

        let expires_at: i64 = expiry.parse().map_err(|_| SessionError::Malformed)?;
        if expires_at <= now {
            return Err(SessionError::Expired);
        }

        let email = URL_SAFE_NO_PAD
            .decode(encoded_email)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|email| !email.is_empty())
            .ok_or(SessionError::Malformed)?;

        Ok(Session { email, expires_at })
    }

    /// Verify the session cookie carried by a request.
    pub fn verify_headers(&self, headers: &HeaderMap, now: i64) -> Result<Session, SessionError> {
        let value = find_cookie(headers, &self.cookie_name).ok_or(SessionError::Missing)?;
        self.verify(value, now)
    }

    fn sign(&self, payload: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .signer
            .verify_headers(&parts.headers, chrono::Utc::now().timestamp())
            .map_err(|e| {
                debug!(
                    path = %parts.uri.path(),
                    reason = %e,
                    "Rejected request without valid session"
                );
                ApiError::Unauthenticated
            })
    }
}
