//! Signed session tokens and the cookies that carry them.
//!
//! A successful sign-in issues an HS256 JWT whose subject is the local user
//! id. Browsers carry it in the `medibot_session` cookie; API clients may send
//! it as `Authorization: Bearer <token>` instead.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medibot_types::error::AuthError;

pub const SESSION_COOKIE: &str = "medibot_session";
pub const STATE_COOKIE: &str = "medibot_oauth_state";

/// Lifetime of the OAuth CSRF state cookie.
const STATE_COOKIE_MAX_AGE_SECS: u64 = 600;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (local user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Issues and verifies session tokens.
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
    secure: bool,
}

impl SessionTokens {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
            secure: false,
        }
    }

    /// Mark cookies `Secure` (set when the public URL is https).
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.ttl_secs as usize,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Verify signature and expiry, returning the user id.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        data.claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }

    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(SESSION_COOKIE, token, self.ttl_secs)
    }

    pub fn clear_session_cookie(&self) -> String {
        self.cookie(SESSION_COOKIE, "", 0)
    }

    pub fn state_cookie(&self, state: &str) -> String {
        self.cookie(STATE_COOKIE, state, STATE_COOKIE_MAX_AGE_SECS)
    }

    pub fn clear_state_cookie(&self) -> String {
        self.cookie(STATE_COOKIE, "", 0)
    }

    fn cookie(&self, name: &str, value: &str, max_age: u64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!("{name}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}{secure}")
    }
}

/// Read a cookie value from the request's `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// The session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| cookie_value(headers, SESSION_COOKIE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn issue_then_verify() {
        let tokens = SessionTokens::new(b"test-secret", 3600);
        let user_id = Uuid::now_v7();
        let token = tokens.issue(user_id).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn verify_rejects_other_key_and_garbage() {
        let issuer = SessionTokens::new(b"key-a", 3600);
        let verifier = SessionTokens::new(b"key-b", 3600);
        let token = issuer.issue(Uuid::now_v7()).unwrap();

        assert!(matches!(verifier.verify(&token), Err(AuthError::InvalidToken(_))));
        assert!(matches!(issuer.verify("not.a.jwt"), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let tokens = SessionTokens::new(b"test-secret", 3600);
        let past = (chrono::Utc::now().timestamp() - 7200) as usize;
        let claims = Claims {
            sub: Uuid::now_v7().to_string(),
            exp: past,
            iat: past - 60,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn cookie_attributes() {
        let tokens = SessionTokens::new(b"k", 60);
        let cookie = tokens.session_cookie("abc");
        assert!(cookie.starts_with("medibot_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(!cookie.contains("Secure"));

        let secure = SessionTokens::new(b"k", 60).with_secure_cookies(true);
        assert!(secure.clear_session_cookie().ends_with("Max-Age=0; Secure"));
    }

    #[test]
    fn reads_cookie_and_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; medibot_session=tok123; medibot_oauth_state=st"),
        );
        assert_eq!(cookie_value(&headers, STATE_COOKIE).as_deref(), Some("st"));
        assert_eq!(session_token(&headers).as_deref(), Some("tok123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer bearer-tok"));
        assert_eq!(session_token(&headers).as_deref(), Some("bearer-tok"));

        assert!(session_token(&HeaderMap::new()).is_none());
    }
}
