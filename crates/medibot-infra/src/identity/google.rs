//! Google OAuth 2.0 / OpenID Connect identity provider.
//!
//! Implements `IdentityProvider` with the authorization-code flow: the
//! browser is sent to Google's consent screen, the returned code is
//! exchanged for an access token, and the profile is read from the OIDC
//! userinfo endpoint (falling back to the legacy v2 endpoint).

use std::time::Duration;

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use medibot_core::identity::IdentityProvider;
use medibot_types::config::AuthConfig;
use medibot_types::error::AuthError;
use medibot_types::user::ExternalIdentity;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const LEGACY_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const SCOPES: &str = "openid email profile";

/// Path of the OAuth redirect handler, relative to the public URL.
pub const CALLBACK_PATH: &str = "/callback";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Profile fields from either userinfo endpoint. OIDC sends `sub`, v2 sends `id`.
#[derive(Debug, Default, Deserialize)]
struct UserInfo {
    sub: Option<String>,
    id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl UserInfo {
    fn into_identity(self) -> Result<ExternalIdentity, AuthError> {
        let subject = self
            .sub
            .or(self.id)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingField("sub"))?;
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or(AuthError::MissingField("email"))?;
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());

        Ok(ExternalIdentity {
            subject,
            email,
            name,
            avatar_url: self.picture.filter(|p| !p.is_empty()),
        })
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Google sign-in via the authorization-code flow.
///
/// Does NOT derive Debug: holds the client secret.
pub struct GoogleIdentityProvider {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    http: reqwest::Client,
}

impl GoogleIdentityProvider {
    pub fn new(client_id: String, client_secret: SecretString, redirect_uri: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("medibot/0.1")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            client_id,
            client_secret,
            redirect_uri,
            http,
        }
    }

    /// Build the provider from `[auth]` settings, redirecting back to
    /// `{public_url}/callback`.
    pub fn from_config(auth: &AuthConfig, public_url: &str) -> Result<Self, AuthError> {
        let client_id = auth
            .google_client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::NotConfigured)?;
        let client_secret = auth
            .google_client_secret
            .clone()
            .ok_or(AuthError::NotConfigured)?;

        let redirect_uri = format!("{}{CALLBACK_PATH}", public_url.trim_end_matches('/'));
        Ok(Self::new(client_id.to_string(), client_secret, redirect_uri))
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::CodeExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::CodeExchange(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::CodeExchange(format!("invalid token response: {e}")))?;
        Ok(token.access_token)
    }

    async fn fetch_userinfo(&self, url: &str, access_token: &str) -> Result<UserInfo, AuthError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::UserInfo(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::UserInfo(format!("{url} returned {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::UserInfo(format!("invalid userinfo response: {e}")))
    }
}

impl IdentityProvider for GoogleIdentityProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| AuthError::CodeExchange(format!("invalid authorize url: {e}")))?;

        Ok(url.into())
    }

    async fn resolve(&self, code: &str) -> Result<ExternalIdentity, AuthError> {
        let access_token = self.exchange_code(code).await?;

        let info = match self.fetch_userinfo(USERINFO_URL, &access_token).await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "OIDC userinfo failed, trying legacy endpoint");
                self.fetch_userinfo(LEGACY_USERINFO_URL, &access_token).await?
            }
        };

        let identity = info.into_identity()?;
        debug!(subject = %identity.subject, "resolved google identity");
        Ok(identity)
    }
}
