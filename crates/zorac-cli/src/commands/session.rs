//! /clear, /save and /load

use zorac_core::ZoracError;

use crate::app::App;

pub async fn clear(app: &mut App) {
    match app.controller.reset().await {
        Ok(()) => app.console.success("Conversation history cleared and saved!"),
        Err(e) => app.console.warn(&format!(
            "Conversation history cleared, but saving failed: {}",
            e
        )),
    }
}

pub async fn save(app: &mut App) {
    match app.controller.save().await {
        Ok(()) => app.console.success(&format!(
            "Session saved to {}",
            app.controller.store_location()
        )),
        Err(e) => app.console.error(&format!("Failed to save session: {}", e)),
    }
}

pub async fn load(app: &mut App) {
    match app.controller.reload().await {
        Ok(count) => app.console.success(&format!(
            "Session reloaded ({} messages, ~{} tokens)",
            count,
            app.controller.token_count()
        )),
        Err(ZoracError::SessionNotFound { .. }) => app.console.error("No saved session found"),
        Err(e) => app.console.error(&format!("Failed to load session: {}", e)),
    }
}
