/// `/config` subcommands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    List,
    Get(String),
    Set { key: String, value: String },
    /// Malformed invocation; show usage
    Usage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Clear,
    Save,
    Load,
    Tokens,
    Summarize,
    Summary,
    Reconnect,
    Config(ConfigCommand),
    Unknown(String),
}

/// A classified line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Command(Command),
    Chat(String),
}

/// Classify one line of input. Lines starting with `/` are commands; config
/// keys are upper-cased and a `set` value keeps its inner spaces.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if !line.starts_with('/') {
        return Input::Chat(line.to_string());
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let trigger = parts.next().unwrap_or_default().to_lowercase();
    let rest = parts.next().unwrap_or_default().trim();

    let command = match trigger.as_str() {
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        "/clear" => Command::Clear,
        "/save" => Command::Save,
        "/load" => Command::Load,
        "/tokens" => Command::Tokens,
        "/summarize" => Command::Summarize,
        "/summary" => Command::Summary,
        "/reconnect" => Command::Reconnect,
        "/config" => Command::Config(parse_config(rest)),
        _ => Command::Unknown(trigger),
    };
    Input::Command(command)
}

fn parse_config(args: &str) -> ConfigCommand {
    let mut parts = args.splitn(3, char::is_whitespace);
    let sub = parts.next().unwrap_or_default().to_lowercase();
    let key = parts.next().map(|k| k.trim().to_uppercase());
    let value = parts.next().map(|v| v.trim().to_string());

    match (sub.as_str(), key, value) {
        ("" | "list", _, _) => ConfigCommand::List,
        ("get", Some(key), _) if !key.is_empty() => ConfigCommand::Get(key),
        ("set", Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
            ConfigCommand::Set { key, value }
        }
        _ => ConfigCommand::Usage,
    }
}
