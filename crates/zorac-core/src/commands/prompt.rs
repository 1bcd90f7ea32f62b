use chrono::{Local, NaiveDate};

use super::registry::{COMMANDS, KEYBOARD_SHORTCUTS};

/// Primary system message for today
pub fn system_prompt() -> String {
    system_prompt_on(Local::now().date_naive())
}

/// Primary system message for `date`: identity, date and command reference
pub fn system_prompt_on(date: NaiveDate) -> String {
    let mut lines = vec![
        format!(
            "You are Zorac, a helpful AI assistant. Today's date is {}.",
            date.format("%A, %B %d, %Y")
        ),
        "The user is interacting with you through Zorac, a terminal-based chat client for local LLMs."
            .to_string(),
        String::new(),
        "Available Commands:".to_string(),
    ];
    for info in COMMANDS {
        lines.push(format!("{} - {}", info.triggers.join(" or "), info.detailed));
    }

    lines.push(String::new());
    lines.push("Keyboard Shortcuts:".to_string());
    for (key, description) in KEYBOARD_SHORTCUTS {
        lines.push(format!("{} - {}", key, description));
    }

    lines.push(String::new());
    lines.push(
        "When users ask about functionality, explain these commands and suggest them when relevant."
            .to_string(),
    );
    lines.join("\n")
}
