//! Rendering collaborator contract

use crate::llm::MessageRole;
use crate::streaming::LiveMetrics;

/// Opaque handle to a block opened with [`Renderer::begin_block`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(pub u64);

/// Output surface driven by the stream coordinator.
///
/// Calls arrive from the generation task, so implementations synchronise
/// internally.
pub trait Renderer: Send + Sync {
    /// Open a new message block for `role`
    fn begin_block(&self, role: MessageRole) -> BlockHandle;

    /// Append a text fragment to an open block
    fn append_text(&self, block: BlockHandle, fragment: &str);

    /// Close a block; no further text is appended to it
    fn finalize(&self, block: BlockHandle);

    /// Replace the status line
    fn update_status(&self, status: &str);

    /// Report live metrics after a fragment
    fn update_metrics(&self, metrics: &LiveMetrics) {
        self.update_status(&metrics.to_string());
    }
}
