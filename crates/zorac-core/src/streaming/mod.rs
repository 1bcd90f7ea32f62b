//! Generation streaming
//!
//! The [`StreamCoordinator`] runs one completion at a time, relays fragments
//! to a [`Renderer`] and produces a [`StreamingResult`]. Token counts shown
//! while streaming are advisory; the count in the final result is a single
//! recount of the accumulated text.

mod coordinator;
mod metrics;
mod render;
mod result;

pub use coordinator::{Generation, GenerationSettings, StreamCoordinator};
pub use metrics::{LiveMetrics, tokens_per_second};
pub use render::{BlockHandle, Renderer};
pub use result::StreamingResult;

#[cfg(test)]
mod tests;
