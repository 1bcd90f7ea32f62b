//! Error types for Zorac
//!
//! Every fallible operation in the core returns [`ZoracResult`]. The variants
//! follow the recovery taxonomy used by the chat loop:
//!
//! - `Connection`: endpoint unreachable, the user may retry
//! - `Request`: endpoint reachable but rejected or garbled the request
//! - `Persistence`: disk read/write failure, chat continues in memory
//! - `UnknownEncoding`: tokenizer id not recognised, a default is used instead
//! - `Cancelled`: user-initiated interrupt, not a failure

mod constructors;
mod conversions;
mod types;

pub use types::{ZoracError, ZoracResult};
