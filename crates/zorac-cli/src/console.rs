//! CLI console: status output and the terminal side of response rendering

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use zorac_core::{BlockHandle, MessageRole, Renderer};

use crate::ui::MarkdownRenderer;

/// Text of the block currently being written
#[derive(Default)]
struct OpenBlock {
    handle: Option<BlockHandle>,
    buffered: String,
    received: bool,
}

/// CLI console for formatted output.
///
/// Streamed responses are relayed raw as fragments arrive; complete responses
/// are buffered and rendered as markdown when the block closes.
pub struct CliConsole {
    verbose: bool,
    spinner: Mutex<Option<ProgressBar>>,
    block: Mutex<OpenBlock>,
    next_block: AtomicU64,
    streaming: AtomicBool,
    markdown: Mutex<MarkdownRenderer>,
}

impl CliConsole {
    pub fn new(verbose: bool, code_theme: &str) -> Self {
        Self {
            verbose,
            spinner: Mutex::new(None),
            block: Mutex::new(OpenBlock::default()),
            next_block: AtomicU64::new(1),
            streaming: AtomicBool::new(true),
            markdown: Mutex::new(MarkdownRenderer::new(code_theme)),
        }
    }

    /// Relay fragments live (true) or render the finished block as markdown
    pub fn set_streaming(&self, streaming: bool) {
        self.streaming.store(streaming, Ordering::SeqCst);
    }

    /// Returns false when the theme is unknown and the fallback is used
    pub fn set_code_theme(&self, theme: &str) -> bool {
        self.markdown.lock().set_theme(theme)
    }

    pub fn render_markdown(&self, text: &str) -> String {
        self.markdown.lock().render(text)
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }

    /// Only shown with --verbose
    pub fn detail(&self, message: &str) {
        if self.verbose {
            println!("{}", message.dimmed());
        }
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Dimmed one-line status, e.g. the per-turn stats
    pub fn status(&self, message: &str) {
        println!("{}", message.dimmed());
    }

    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.chars().count()).dimmed());
    }

    /// Aligned two-column rows
    pub fn print_table(&self, rows: &[(String, String)]) {
        let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        for (key, value) in rows {
            println!("  {:<width$}  {}", key.cyan(), value, width = width);
        }
    }

    pub fn prompt(&self) {
        print!("\n{} ", "You:".bold().blue());
        io::stdout().flush().ok();
    }

    /// Show a spinner until [`stop_progress`](Self::stop_progress)
    pub fn start_progress(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Some(previous) = self.spinner.lock().replace(pb) {
            previous.finish_and_clear();
        }
    }

    pub fn stop_progress(&self) {
        if let Some(pb) = self.spinner.lock().take() {
            pb.finish_and_clear();
        }
    }
}

impl Renderer for CliConsole {
    fn begin_block(&self, role: MessageRole) -> BlockHandle {
        let handle = BlockHandle(self.next_block.fetch_add(1, Ordering::SeqCst));
        *self.block.lock() = OpenBlock {
            handle: Some(handle),
            ..OpenBlock::default()
        };

        let label = match role {
            MessageRole::Assistant => "Assistant:".bold().purple(),
            MessageRole::User => "You:".bold().blue(),
            MessageRole::System => "System:".bold().dimmed(),
        };
        println!("\n{}", label);
        self.start_progress("Thinking...");
        handle
    }

    fn append_text(&self, block: BlockHandle, fragment: &str) {
        let mut open = self.block.lock();
        if open.handle != Some(block) {
            return;
        }
        if !open.received {
            open.received = true;
            self.stop_progress();
        }

        if self.streaming.load(Ordering::SeqCst) {
            print!("{}", fragment);
            io::stdout().flush().ok();
        } else {
            open.buffered.push_str(fragment);
        }
    }

    fn finalize(&self, block: BlockHandle) {
        self.stop_progress();
        let mut open = self.block.lock();
        if open.handle != Some(block) {
            return;
        }
        let buffered = std::mem::take(&mut open.buffered);
        open.handle = None;
        drop(open);

        if !buffered.is_empty() {
            print!("{}", self.render_markdown(&buffered));
        }
        println!();
    }

    fn update_status(&self, status: &str) {
        if let Some(pb) = self.spinner.lock().as_ref() {
            pb.set_message(status.to_string());
        }
    }
}
