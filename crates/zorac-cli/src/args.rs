//! CLI argument definitions using clap

use clap::Parser;
use zorac_core::Overrides;

#[derive(Parser, Debug)]
#[command(name = "zorac")]
#[command(about = "Zorac - terminal chat client for self-hosted LLM servers")]
#[command(
    long_about = r#"Zorac - terminal chat client for self-hosted LLM servers

Settings resolve as flag > environment variable > ~/.zorac/config.json > default.
Type /help inside the chat for the list of commands."#
)]
#[command(version)]
pub struct Cli {
    /// Inference server base URL, e.g. http://localhost:8000/v1
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model to chat with
    #[arg(long, short)]
    pub model: Option<String>,

    /// Wait for complete responses instead of streaming them
    #[arg(long)]
    pub no_stream: bool,

    /// Enable verbose output and debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            stream: self.no_stream.then_some(false),
        }
    }
}
