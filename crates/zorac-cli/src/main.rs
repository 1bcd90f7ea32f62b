//! Zorac terminal chat client
//!
//! An interactive chat loop against a self-hosted, OpenAI-compatible
//! inference server (vLLM, llama.cpp server, ...). The conversation is kept
//! within the model's input budget by folding older turns into a summary, and
//! is persisted between runs.
//!
//! ```bash
//! cargo install --path crates/zorac-cli
//! zorac --base-url http://gpu-box:8000/v1
//! ```

mod app;
mod args;
mod commands;
mod console;
mod history;
mod setup;
mod signal_handler;
mod ui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the streamed reply.
    // RUST_LOG takes precedence over --verbose.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    app::run(cli).await
}
