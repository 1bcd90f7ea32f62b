//! Terminal rendering helpers

pub mod markdown;

pub use markdown::MarkdownRenderer;
