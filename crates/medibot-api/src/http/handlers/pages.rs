//! Page handlers.

use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::http::extractors::auth::CurrentUser;

const CHAT_PAGE: &str = include_str!("../../../templates/chat.html");

/// GET / - Send the browser to the chat or the login page.
pub async fn index(user: Option<CurrentUser>) -> Response {
    match user {
        Some(_) => Redirect::to("/chat").into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

/// GET /chat - Chat page for the signed-in user.
pub async fn chat_page(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(render_chat_page(&user.name, user.avatar_url.as_deref()))
}

fn render_chat_page(name: &str, avatar_url: Option<&str>) -> String {
    CHAT_PAGE
        .replace("{{user_name}}", &escape_html(name))
        .replace("{{avatar_url}}", &escape_html(avatar_url.unwrap_or("")))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
