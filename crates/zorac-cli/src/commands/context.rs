//! /tokens, /summarize and /summary

use crate::app::App;

pub fn tokens(app: &App) {
    let usage = app.controller.token_usage();
    app.console.print_header("Token usage");
    app.console.print_table(&[
        ("Current".to_string(), format!("~{} tokens", usage.current)),
        ("Limit".to_string(), format!("{} tokens", usage.limit)),
        ("Remaining".to_string(), format!("~{} tokens", usage.remaining)),
        ("Messages".to_string(), usage.messages.to_string()),
    ]);

    let stats = app.controller.stats();
    if stats.total_compactions > 0 {
        app.console.detail(&format!(
            "Compactions this run: {} ({} tokens saved)",
            stats.total_compactions, stats.total_tokens_saved
        ));
    }
}

pub async fn summarize(app: &mut App) {
    if !app.controller.can_summarize() {
        app.console.warn(&format!(
            "Not enough messages to summarize. Need more than {} messages.",
            app.controller.settings().keep_recent_messages + 1
        ));
        return;
    }

    let client = app.coordinator.client();
    app.console.start_progress("Summarizing conversation history...");
    let result = app.controller.force_summarize(client.as_ref()).await;
    app.console.stop_progress();

    app.report_compaction(&result);
    if result.was_compacted {
        app.console.success("Session saved with summary");
    }
}

pub fn summary(app: &App) {
    match app.controller.current_summary() {
        Some(text) => {
            app.console.print_header("Current Conversation Summary");
            println!("{}", app.console.render_markdown(text));
        }
        None => app
            .console
            .info("No summary has been created yet. Use /summarize to create one."),
    }
}
