//! User administration CLI commands.

use anyhow::{Context, Result};
use console::style;
use dialoguer::Confirm;

use medibot_core::repository::user::UserRepository;

use crate::state::AppState;

/// Delete a user and every session and turn they own.
pub async fn delete_user(state: &AppState, email: &str, force: bool, json: bool) -> Result<()> {
    let user = state
        .identity_service
        .find_by_email(email)
        .await?
        .with_context(|| format!("User '{email}' not found"))?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete '{}' and all of their chat history?",
                style(&user.email).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.identity_service.user_repo().delete(&user.id).await?;
    state.chat_service.forget_user(user.id);

    if json {
        let out = serde_json::json!({
            "deleted": true,
            "user_id": user.id,
            "email": user.email,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} Deleted user {}",
            style("✓").green().bold(),
            style(&user.email).cyan()
        );
        println!();
    }

    Ok(())
}
