//! Sign-in flow handlers.
//!
//! Endpoints:
//! - GET /login         - Login page (redirects to /chat when signed in)
//! - GET /login/google  - Start the Google authorization-code flow
//! - GET /callback      - OAuth redirect target; signs the user in
//! - GET /logout        - Clear the session cookie

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use uuid::Uuid;

use medibot_core::identity::IdentityProvider;
use medibot_types::error::AuthError;
use medibot_types::user::User;

use crate::http::extractors::auth::CurrentUser;
use crate::http::session::{STATE_COOKIE, cookie_value};
use crate::state::AppState;

const LOGIN_PAGE: &str = include_str!("../../../templates/login.html");

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /login - Render the login page.
pub async fn login_page(user: Option<CurrentUser>) -> Response {
    if user.is_some() {
        return Redirect::to("/chat").into_response();
    }
    Html(LOGIN_PAGE).into_response()
}

/// GET /login/google - Redirect to Google with a fresh CSRF state cookie.
pub async fn login_google(State(state): State<AppState>) -> Response {
    let Some(provider) = state.identity_provider.as_deref() else {
        tracing::warn!("Google sign-in requested but GOOGLE_CLIENT_ID/SECRET are not set");
        return Redirect::to("/login").into_response();
    };

    let csrf_state = Uuid::new_v4().to_string();
    match provider.authorize_url(&csrf_state) {
        Ok(url) => (
            AppendHeaders([(SET_COOKIE, state.session_tokens.state_cookie(&csrf_state))]),
            Redirect::to(&url),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build authorization URL");
            Redirect::to("/login").into_response()
        }
    }
}

/// GET /callback - Resolve the identity, upsert the user and start a session.
///
/// Any failure sends the browser back to /login.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let clear_state = state.session_tokens.clear_state_cookie();

    match sign_in(&state, &headers, params).await {
        Ok(user) => match state.session_tokens.issue(user.id) {
            Ok(token) => (
                AppendHeaders([
                    (SET_COOKIE, clear_state),
                    (SET_COOKIE, state.session_tokens.session_cookie(&token)),
                ]),
                Redirect::to("/chat"),
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to issue session token");
                (AppendHeaders([(SET_COOKIE, clear_state)]), Redirect::to("/login")).into_response()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            (AppendHeaders([(SET_COOKIE, clear_state)]), Redirect::to("/login")).into_response()
        }
    }
}

async fn sign_in(
    state: &AppState,
    headers: &HeaderMap,
    params: CallbackParams,
) -> Result<User, AuthError> {
    if let Some(error) = params.error {
        return Err(AuthError::CodeExchange(format!("provider returned error: {error}")));
    }

    let provider = state
        .identity_provider
        .as_deref()
        .ok_or(AuthError::NotConfigured)?;

    let expected = cookie_value(headers, STATE_COOKIE);
    match (params.state.as_deref(), expected.as_deref()) {
        (Some(got), Some(want)) if got == want => {}
        _ => return Err(AuthError::StateMismatch),
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::CodeExchange("missing authorization code".to_string()))?;

    let identity = provider.resolve(&code).await?;
    state.identity_service.upsert(&identity).await
}

/// GET /logout - Clear the session cookie and return to the login page.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, state.session_tokens.clear_session_cookie())]),
        Redirect::to("/login"),
    )
}
