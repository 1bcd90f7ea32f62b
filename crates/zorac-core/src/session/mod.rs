//! Durable persistence of the conversation

mod storage;

pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};
