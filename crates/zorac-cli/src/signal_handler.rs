//! Ctrl+C handling for the interactive loop
//!
//! SIGINT is delivered as a stream instead of terminating the process, so the
//! loop decides what it means: interrupt the running response, or save and
//! exit when idle.

use futures::stream::StreamExt;
use signal_hook::consts::SIGINT;
use signal_hook_tokio::{Handle, Signals};
use std::io;

/// What Ctrl+C should do in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// A response is being generated; stop it and keep the session open
    CancelResponse,
    /// Waiting at the prompt; save and exit
    Exit,
}

impl InterruptAction {
    pub fn for_state(generating: bool) -> Self {
        if generating {
            Self::CancelResponse
        } else {
            Self::Exit
        }
    }
}

/// Registered SIGINT stream; unregistered on drop
pub struct SignalHandler {
    signals: Signals,
    handle: Handle,
}

impl SignalHandler {
    pub fn register() -> io::Result<Self> {
        let signals = Signals::new([SIGINT])?;
        let handle = signals.handle();
        Ok(Self { signals, handle })
    }

    /// Wait for the next Ctrl+C
    pub async fn interrupted(&mut self) -> Option<i32> {
        self.signals.next().await
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        self.handle.close();
    }
}
