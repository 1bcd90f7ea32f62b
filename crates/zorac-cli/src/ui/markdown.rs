//! Markdown rendering for terminal output

use colored::*;
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};
use textwrap::{Options, wrap};
use tracing::warn;

/// Theme used when the configured one is not bundled with syntect
pub const FALLBACK_THEME: &str = "base16-ocean.dark";

const DEFAULT_WIDTH: usize = 80;

/// Renders complete markdown documents with highlighted code blocks
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
    width: usize,
}

impl MarkdownRenderer {
    pub fn new(theme: &str) -> Self {
        let mut renderer = Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme: FALLBACK_THEME.to_string(),
            width: DEFAULT_WIDTH,
        };
        renderer.set_theme(theme);
        renderer
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(20);
        self
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Switch the code theme. Returns false, keeping the fallback, when the
    /// theme is unknown.
    pub fn set_theme(&mut self, theme: &str) -> bool {
        if self.theme_set.themes.contains_key(theme) {
            self.theme = theme.to_string();
            true
        } else {
            warn!("Unknown code theme {:?}, using {}", theme, FALLBACK_THEME);
            self.theme = FALLBACK_THEME.to_string();
            false
        }
    }

    pub fn available_themes(&self) -> Vec<&str> {
        self.theme_set.themes.keys().map(String::as_str).collect()
    }

    /// Render markdown to colored terminal text
    pub fn render(&self, markdown: &str) -> String {
        let mut output = String::new();
        let mut paragraph = String::new();
        let mut code_lang = String::new();
        let mut code = String::new();
        let mut in_code_block = false;
        let mut heading_level: Option<usize> = None;
        let mut emphasis = 0usize;
        let mut strong = 0usize;
        let mut quote_depth = 0usize;
        let mut lists: Vec<Option<u64>> = Vec::new();

        for event in Parser::new(markdown) {
            match event {
                Event::Start(tag) => match tag {
                    Tag::Heading(level, _, _) => {
                        self.flush(&mut output, &mut paragraph, quote_depth);
                        heading_level = Some(level as usize);
                    }
                    Tag::List(start) => {
                        self.flush(&mut output, &mut paragraph, quote_depth);
                        lists.push(start);
                    }
                    Tag::Item => {
                        self.flush(&mut output, &mut paragraph, quote_depth);
                        let indent = "  ".repeat(lists.len().saturating_sub(1));
                        let bullet = match lists.last_mut() {
                            Some(Some(n)) => {
                                let bullet = format!("{}.", n);
                                *n += 1;
                                bullet
                            }
                            _ => "•".to_string(),
                        };
                        paragraph.push_str(&format!("{}{} ", indent, bullet));
                    }
                    Tag::CodeBlock(kind) => {
                        self.flush(&mut output, &mut paragraph, quote_depth);
                        in_code_block = true;
                        if let CodeBlockKind::Fenced(lang) = kind {
                            code_lang = lang.split_whitespace().next().unwrap_or_default().to_string();
                        }
                    }
                    Tag::Emphasis => emphasis += 1,
                    Tag::Strong => strong += 1,
                    Tag::BlockQuote => {
                        self.flush(&mut output, &mut paragraph, quote_depth);
                        quote_depth += 1;
                    }
                    _ => {}
                },
                Event::End(tag) => match tag {
                    Tag::Heading(_, _, _) => {
                        let level = heading_level.take().unwrap_or(1);
                        output.push_str(&format_heading(paragraph.trim(), level));
                        output.push_str("\n\n");
                        paragraph.clear();
                    }
                    Tag::Paragraph => {
                        self.flush(&mut output, &mut paragraph, quote_depth);
                        if lists.is_empty() {
                            output.push('\n');
                        }
                    }
                    Tag::Item => self.flush(&mut output, &mut paragraph, quote_depth),
                    Tag::List(_) => {
                        self.flush(&mut output, &mut paragraph, quote_depth);
                        lists.pop();
                        if lists.is_empty() {
                            output.push('\n');
                        }
                    }
                    Tag::CodeBlock(_) => {
                        output.push_str(&self.highlight_code(&code, &code_lang));
                        output.push('\n');
                        in_code_block = false;
                        code.clear();
                        code_lang.clear();
                    }
                    Tag::Emphasis => emphasis = emphasis.saturating_sub(1),
                    Tag::Strong => strong = strong.saturating_sub(1),
                    Tag::BlockQuote => {
                        self.flush(&mut output, &mut paragraph, quote_depth);
                        quote_depth = quote_depth.saturating_sub(1);
                    }
                    Tag::Link(_, dest, _) => {
                        paragraph.push_str(&format!(" ({})", dest.blue().underline()));
                    }
                    _ => {}
                },
                Event::Text(text) if in_code_block => code.push_str(&text),
                Event::Text(text) => {
                    let styled = if strong > 0 {
                        text.bold().to_string()
                    } else if emphasis > 0 {
                        text.italic().to_string()
                    } else {
                        text.to_string()
                    };
                    paragraph.push_str(&styled);
                }
                Event::Code(inline) => {
                    paragraph.push_str(&inline.bright_yellow().to_string());
                }
                Event::SoftBreak => paragraph.push(' '),
                Event::HardBreak => paragraph.push('\n'),
                Event::Rule => {
                    self.flush(&mut output, &mut paragraph, quote_depth);
                    output.push_str(&"─".repeat(self.width).bright_black().to_string());
                    output.push_str("\n\n");
                }
                _ => {}
            }
        }

        self.flush(&mut output, &mut paragraph, quote_depth);
        output.trim_end().to_string()
    }

    /// Move the pending paragraph into `output`, wrapped to the width
    fn flush(&self, output: &mut String, paragraph: &mut String, quote_depth: usize) {
        if paragraph.trim().is_empty() {
            paragraph.clear();
            return;
        }

        let prefix = "│ ".repeat(quote_depth);
        let width = self.width.saturating_sub(prefix.chars().count()).max(10);
        for line in paragraph.lines() {
            for wrapped in wrap(line, Options::new(width)) {
                if !prefix.is_empty() {
                    output.push_str(&prefix.bright_black().to_string());
                }
                output.push_str(&wrapped);
                output.push('\n');
            }
        }
        paragraph.clear();
    }

    fn current_theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme)
            .or_else(|| self.theme_set.themes.get(FALLBACK_THEME))
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let border = "─".repeat(self.width.saturating_sub(2));
        let mut output = String::new();
        output.push_str(&format!("┌{}┐\n", border).bright_black().to_string());

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let mut highlighter = self.current_theme().map(|theme| HighlightLines::new(syntax, theme));

        for line in LinesWithEndings::from(code) {
            output.push_str(&"│ ".bright_black().to_string());
            let ranges: Option<Vec<(Style, &str)>> = highlighter
                .as_mut()
                .and_then(|h| h.highlight_line(line, &self.syntax_set).ok());
            match ranges {
                Some(ranges) => {
                    output.push_str(&as_24_bit_terminal_escaped(&ranges, false));
                    output.push_str("\x1b[0m");
                }
                None => output.push_str(line),
            }
            if !line.ends_with('\n') {
                output.push('\n');
            }
        }

        output.push_str(&format!("└{}┘", border).bright_black().to_string());
        output
    }
}

/// Headings stay left-aligned; the level only changes the color
fn format_heading(text: &str, level: usize) -> String {
    match level {
        1 => text.bright_blue().bold().underline().to_string(),
        2 => text.bright_green().bold().to_string(),
        3 => text.bright_yellow().bold().to_string(),
        _ => text.bold().to_string(),
    }
}
