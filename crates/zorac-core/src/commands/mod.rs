//! Interactive command table and input parsing
//!
//! The table is the single description of every slash command. The CLI uses
//! it for `/help`, and the primary system message embeds it so the model can
//! point users at the right command.

mod parse;
mod prompt;
mod registry;

pub use parse::{Command, ConfigCommand, Input, parse_input};
pub use prompt::{system_prompt, system_prompt_on};
pub use registry::{COMMANDS, CommandInfo, KEYBOARD_SHORTCUTS, help_rows};
