//! Session listing CLI command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

/// List a user's sessions, most recently active first.
///
/// # Examples
///
/// ```bash
/// medibot sessions ana@example.com
/// medibot sessions ana@example.com --json
/// ```
pub async fn list_sessions(state: &AppState, email: &str, json: bool) -> Result<()> {
    let user = state
        .identity_service
        .find_by_email(email)
        .await?
        .with_context(|| format!("User '{email}' not found"))?;

    let sessions = state.chat_service.list_sessions(user.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions found for '{}'.",
            style("i").blue().bold(),
            style(&user.email).cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Turns").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Last active").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for session in &sessions {
        table.add_row(vec![
            Cell::new(truncate(&session.title, 48)),
            Cell::new(session.message_count),
            Cell::new(session.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M")),
            Cell::new(session.id).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!(
        "  Sessions for {} ({})",
        style(&user.name).cyan().bold(),
        sessions.len()
    );
    println!("{table}");
    println!();

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars - 1).collect();
        format!("{cut}…")
    }
}
