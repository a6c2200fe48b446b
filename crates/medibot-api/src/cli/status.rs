//! System status command.

use anyhow::Result;
use console::style;

use medibot_core::chat::repository::ChatRepository;
use medibot_core::repository::user::UserRepository;

use crate::state::AppState;

/// Display record counts and the active configuration.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.identity_service.user_repo().count().await?;
    let sessions = state.chat_service.chat_repo().count_sessions().await?;
    let turns = state.chat_service.chat_repo().count_all_turns().await?;

    let config = &state.config;
    let google = state.identity_provider.is_some();
    let llm_key = config.llm.api_key.is_some();
    let index_ready = config.retrieval.index_host.is_some() && config.retrieval.api_key.is_some();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "counts": {
                "users": users,
                "sessions": sessions,
                "turns": turns,
            },
            "llm": {
                "base_url": config.llm.base_url,
                "model": config.llm.model,
                "api_key_set": llm_key,
            },
            "retrieval": {
                "index": config.retrieval.index_name,
                "top_k": config.retrieval.top_k,
                "configured": index_ready,
            },
            "google_sign_in": google,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let check = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!("  {} Medibot v{}", style("⚕").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Data ──").dim());
    println!("  Users:    {}", style(users).bold());
    println!("  Sessions: {}", style(sessions).bold());
    println!("  Turns:    {}", style(turns).bold());
    println!();

    println!("  {}", style("── Services ──").dim());
    println!(
        "  {} LLM       {} {}",
        check(llm_key),
        style(&config.llm.model).cyan(),
        style(&config.llm.base_url).dim()
    );
    println!(
        "  {} Retrieval {} (top {})",
        check(index_ready),
        style(&config.retrieval.index_name).cyan(),
        config.retrieval.top_k
    );
    println!("  {} Google sign-in", check(google));
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}
