//! Live generation metrics

use std::fmt;
use std::time::Duration;

/// Rate guarded against a zero elapsed time
pub fn tokens_per_second(tokens: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { tokens as f64 / secs } else { 0.0 }
}

/// Running metrics updated per fragment while a response streams.
///
/// `tokens` sums per-fragment counts, which can differ slightly from a count
/// of the whole text when fragments split a multi-token word.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiveMetrics {
    pub tokens: usize,
    pub fragments: usize,
    pub elapsed: Duration,
}

impl LiveMetrics {
    pub fn record(&mut self, fragment_tokens: usize, elapsed: Duration) {
        self.tokens += fragment_tokens;
        self.fragments += 1;
        self.elapsed = elapsed;
    }

    pub fn tokens_per_second(&self) -> f64 {
        tokens_per_second(self.tokens, self.elapsed)
    }
}

impl fmt::Display for LiveMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tokens | {:.1}s | {:.1} tok/s",
            self.tokens,
            self.elapsed.as_secs_f64(),
            self.tokens_per_second()
        )
    }
}
