//! `supportify history`: list or clear stored messages.

use anyhow::Result;
use console::style;

use supportify_types::chat::{HistoryFilter, MessageRole};

use crate::state::AppState;

pub async fn show_history(state: &AppState, filter: HistoryFilter, json: bool) -> Result<()> {
    let messages = state.conversations.history(&filter).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!("  No messages for '{}'.", style(&filter.user_id).cyan());
        println!();
        return Ok(());
    }

    println!();
    for stored in &messages {
        let message = &stored.message;
        let who = match message.role {
            MessageRole::User => style(message.user_id.as_str()).green().bold(),
            MessageRole::Assistant => style(message.agent_id.as_str()).cyan().bold(),
        };
        println!(
            "  {} {} {}",
            style(message.created_at.format("%Y-%m-%d %H:%M:%S")).dim(),
            who,
            message.content
        );
    }
    println!();

    Ok(())
}

pub async fn clear_history(state: &AppState, filter: HistoryFilter, json: bool) -> Result<()> {
    let deleted = state.conversations.delete_history(&filter).await?;

    if json {
        let result = serde_json::json!({
            "user_id": filter.user_id,
            "deleted": deleted,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!(
            "  {} Deleted {} message(s) for '{}'",
            style("ok").green(),
            deleted,
            style(&filter.user_id).cyan(),
        );
        println!();
    }

    Ok(())
}
