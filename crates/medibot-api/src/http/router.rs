//! Axum router configuration with middleware.
//!
//! Pages and the sign-in flow live at the root; the JSON API under
//! `/api/chat`. Middleware: CORS, tracing.
//!
//! When `server.static_dir` points at an existing directory, its files are
//! served for any path no route matches.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/", post(handlers::chat::send_message))
        .route("/sessions", get(handlers::session::list_sessions))
        .route("/session/new", post(handlers::session::new_session))
        .route("/session/{id}", get(handlers::session::get_session))
        .route("/session/{id}/load", post(handlers::session::load_session))
        .route("/session/{id}/delete", delete(handlers::session::delete_session));

    let static_dir = state.config.server.static_dir.clone();

    let mut router = Router::new()
        // Pages and sign-in
        .route("/", get(handlers::pages::index))
        .route("/chat", get(handlers::pages::chat_page))
        .route("/login", get(handlers::auth::login_page))
        .route("/login/google", get(handlers::auth::login_google))
        .route("/callback", get(handlers::auth::callback))
        .route("/logout", get(handlers::auth::logout))
        // Legacy single-shot form endpoint
        .route(
            "/get",
            get(handlers::legacy::get_answer).post(handlers::legacy::get_answer),
        )
        .nest("/api/chat", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(dir) = static_dir {
        if std::path::Path::new(&dir).is_dir() {
            router = router.fallback_service(ServeDir::new(&dir));
            tracing::info!(path = %dir, "Static file serving enabled");
        } else {
            tracing::warn!(path = %dir, "Static directory does not exist, not serving files");
        }
    }

    router
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
