//! Conversation history management
//!
//! Provides bounded, per-conversation chat logs with:
//! - FIFO eviction beyond `max_turns`
//! - Idle expiry (lazy on read + periodic background sweep)
//! - Per-key atomic appends (DashMap entry locking)

mod cache;
mod types;

pub use cache::{HistoryCache, HistoryStore};
pub use types::{HistoryLog, HistoryStats};
