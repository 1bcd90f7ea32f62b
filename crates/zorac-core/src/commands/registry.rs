/// Metadata for one interactive command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    /// Triggers, first one canonical
    pub triggers: &'static [&'static str],
    /// One-line description for `/help`
    pub description: &'static str,
    /// Longer description embedded in the system prompt
    pub detailed: &'static str,
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        triggers: &["/help"],
        description: "Show all available commands",
        detailed: "Display a list of all available interactive commands with descriptions.",
    },
    CommandInfo {
        triggers: &["/quit", "/exit"],
        description: "Save and exit the application",
        detailed: "Save the current conversation session to disk and exit Zorac. \
The session is restored automatically on the next run.",
    },
    CommandInfo {
        triggers: &["/clear"],
        description: "Reset conversation to initial system message",
        detailed: "Clear the entire conversation history and start over with only the \
initial system message. The cleared session is saved to disk immediately.",
    },
    CommandInfo {
        triggers: &["/save"],
        description: "Manually save session to disk",
        detailed: "Save the current conversation session to disk. Sessions are also saved \
after every assistant response.",
    },
    CommandInfo {
        triggers: &["/load"],
        description: "Reload session from disk",
        detailed: "Reload the conversation from the last saved session, discarding any \
unsaved changes.",
    },
    CommandInfo {
        triggers: &["/tokens"],
        description: "Display current token usage statistics",
        detailed: "Show the current token count, the token limit, the remaining capacity \
and the message count, so the user can predict when summarization will happen.",
    },
    CommandInfo {
        triggers: &["/summarize"],
        description: "Force conversation summarization",
        detailed: "Summarize older conversation history now, even below the token limit. \
The most recent messages are kept verbatim.",
    },
    CommandInfo {
        triggers: &["/summary"],
        description: "Display the current conversation summary",
        detailed: "Show the current conversation summary if one exists. Summaries are \
created automatically when the conversation exceeds the token limit, or with /summarize.",
    },
    CommandInfo {
        triggers: &["/reconnect"],
        description: "Retry connection to the inference server",
        detailed: "Check the connection to the inference server again. Useful when the \
server was unavailable at startup or the connection was lost.",
    },
    CommandInfo {
        triggers: &["/config"],
        description: "Manage configuration settings",
        detailed: "Manage Zorac settings: '/config list' shows all values, \
'/config get <KEY>' shows one value and '/config set <KEY> <VALUE>' updates and saves one. \
Settings include server URL, model name, token limits, temperature and streaming mode.",
    },
];

/// Keyboard shortcuts as (key, description) pairs
pub const KEYBOARD_SHORTCUTS: &[(&str, &str)] = &[
    (
        "Ctrl+C",
        "Interrupt a streaming response. The partial response is discarded.",
    ),
    ("Ctrl+D", "Save the session and exit."),
];

/// Rows for `/help`: trigger column and description
pub fn help_rows() -> Vec<(String, &'static str)> {
    let mut rows = Vec::new();
    for info in COMMANDS {
        rows.push((info.triggers.join(", "), info.description));
        if info.triggers.contains(&"/config") {
            rows.push(("  /config list".to_string(), "Show current configuration"));
            rows.push(("  /config get".to_string(), "Get a specific configuration value"));
            rows.push(("  /config set".to_string(), "Set a configuration value"));
        }
    }
    rows
}
