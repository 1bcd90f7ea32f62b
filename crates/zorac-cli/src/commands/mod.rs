//! Slash command handlers
//!
//! Parsing lives in `zorac_core::commands`; these handlers apply a parsed
//! command to the running [`App`].

mod config;
mod context;
mod help;
mod session;

use zorac_core::commands::Command;

use crate::app::App;

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub async fn dispatch(app: &mut App, command: Command) -> Flow {
    match command {
        Command::Help => help::show(app),
        Command::Quit => return Flow::Exit,
        Command::Clear => session::clear(app).await,
        Command::Save => session::save(app).await,
        Command::Load => session::load(app).await,
        Command::Tokens => context::tokens(app),
        Command::Summarize => context::summarize(app).await,
        Command::Summary => context::summary(app),
        Command::Reconnect => {
            app.check_connection().await;
        }
        Command::Config(sub) => config::handle(app, sub).await,
        Command::Unknown(trigger) => app.console.warn(&format!(
            "Unknown command: {}. Type /help for available commands.",
            trigger
        )),
    }
    Flow::Continue
}
