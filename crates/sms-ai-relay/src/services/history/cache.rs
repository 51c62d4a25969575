use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::System;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::types::{HistoryLog, HistoryStats};
use crate::config::HistoryConfig;
use crate::models::chat::{ChatMessage, ConversationId};

/// How long a RAM reading is reused before sysinfo is asked again
const MEMORY_SAMPLE_TTL: Duration = Duration::from_secs(5);

/// Per-conversation chat history.
///
/// Implementations never fail towards the caller: read faults degrade to an
/// empty history and write faults drop the entry, both logged.
pub trait HistoryStore: Send + Sync {
    fn read(&self, id: &ConversationId) -> Vec<ChatMessage>;

    fn append(&self, id: &ConversationId, entry: ChatMessage);

    /// Append a user turn followed by its assistant reply.
    fn append_exchange(&self, id: &ConversationId, user: ChatMessage, assistant: ChatMessage) {
        self.append(id, user);
        self.append(id, assistant);
    }
}

/// Thread-safe in-memory history cache
/// Uses DashMap so each key's read-modify-write runs under its shard lock
#[derive(Clone)]
pub struct HistoryCache {
    /// Conversation storage: conversation id -> log
    storage: Arc<DashMap<ConversationId, HistoryLog>>,

    config: HistoryConfig,

    /// System info for RAM monitoring
    memory: Arc<parking_lot::Mutex<MemorySampler>>,
}

/// Host memory reading, refreshed at most once per `MEMORY_SAMPLE_TTL`
struct MemorySampler {
    system: System,
    sampled_at: Option<Instant>,
}

impl MemorySampler {
    fn new() -> Self {
        Self {
            system: System::new(),
            sampled_at: None,
        }
    }

    fn is_stale(&self, now: Instant) -> bool {
        self.sampled_at
            .map_or(true, |at| now.saturating_duration_since(at) >= MEMORY_SAMPLE_TTL)
    }

    /// (used, total) in bytes
    fn usage(&mut self, now: Instant) -> (u64, u64) {
        if self.is_stale(now) {
            self.system.refresh_memory();
            self.sampled_at = Some(now);
        }
        (self.system.used_memory(), self.system.total_memory())
    }
}

impl HistoryCache {
    pub fn new(config: HistoryConfig) -> Self {
        info!(
            "Initializing history cache: max_turns={}, ttl={}s, sweep={}s",
            config.max_turns, config.ttl_seconds, config.sweep_interval_seconds
        );
        Self {
            storage: Arc::new(DashMap::new()),
            config,
            memory: Arc::new(parking_lot::Mutex::new(MemorySampler::new())),
        }
    }

    /// Read the log for `id` as of `now`. Expired logs read as empty and are
    /// removed on the spot.
    pub fn read_at(&self, id: &ConversationId, now: Instant) -> Vec<ChatMessage> {
        let ttl = self.config.ttl();
        let Some(entry) = self.storage.get(id) else {
            return Vec::new();
        };

        if entry.is_expired(now, ttl) {
            drop(entry); // Release read lock
            self.storage.remove_if(id, |_, log| log.is_expired(now, ttl));
            debug!(conversation = %id, "History expired, removed from cache");
            return Vec::new();
        }

        entry.to_vec()
    }

    pub fn append_at(&self, id: &ConversationId, entry: ChatMessage, now: Instant) {
        self.append_all(id, [entry], now);
    }

    /// Append `entries` in order under a single entry lock.
    fn append_all<I>(&self, id: &ConversationId, entries: I, now: Instant)
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        let ttl = self.config.ttl();
        let max_turns = self.config.max_turns;

        // Checked before taking the entry lock: len() visits every shard.
        if !self.storage.contains_key(id) {
            if let Err(reason) = self.can_create_new_log(now) {
                warn!(conversation = %id, reason = %reason, "Dropping history entry");
                return;
            }
        }

        match self.storage.entry(id.clone()) {
            Entry::Occupied(mut occupied) => {
                let log = occupied.get_mut();
                if log.is_expired(now, ttl) {
                    log.clear();
                }
                for entry in entries {
                    log.push(entry, max_turns, now);
                }
            }
            Entry::Vacant(vacant) => {
                let mut log = HistoryLog::new(now);
                for entry in entries {
                    log.push(entry, max_turns, now);
                }
                vacant.insert(log);
                debug!(conversation = %id, "Created history log");
            }
        }
    }

    /// Check whether a new conversation log may be created
    /// (conversation cap and RAM limit)
    fn can_create_new_log(&self, now: Instant) -> Result<(), String> {
        if self.storage.len() >= self.config.max_conversations {
            // Expired logs already read as absent, reclaim them before refusing
            self.cleanup_expired_at(now);
        }

        let active = self.storage.len();
        if active >= self.config.max_conversations {
            return Err(format!(
                "conversation limit reached ({}/{})",
                active, self.config.max_conversations
            ));
        }

        if self.config.memory_limit_percent >= 100.0 {
            return Ok(());
        }

        let (used_memory, total_memory) = self.memory.lock().usage(now);
        if total_memory == 0 {
            return Ok(());
        }
        let usage_percent = (used_memory as f64 / total_memory as f64) * 100.0;

        if usage_percent >= self.config.memory_limit_percent {
            return Err(format!(
                "memory usage at {:.2}% (used: {} MB, total: {} MB)",
                usage_percent,
                used_memory / 1024 / 1024,
                total_memory / 1024 / 1024
            ));
        }

        Ok(())
    }

    /// Remove every log expired as of `now`.
    /// Returns number of conversations removed
    pub fn cleanup_expired_at(&self, now: Instant) -> usize {
        let ttl = self.config.ttl();
        let start_len = self.storage.len();
        self.storage.retain(|_, log| !log.is_expired(now, ttl));
        let count = start_len.saturating_sub(self.storage.len());

        if count > 0 {
            info!("Cleaned up {} expired conversations", count);
        }

        count
    }

    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    /// Run `cleanup_expired` every `sweep_interval` until the handle is aborted
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let cache = self.clone();
        let period = self.config.sweep_interval().max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = cache.cleanup_expired();
                debug!(removed, remaining = cache.len(), "History sweep finished");
            }
        })
    }

    /// Get number of stored conversations (including not yet swept ones)
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> HistoryStats {
        let (used, total) = self.memory.lock().usage(Instant::now());
        let percent = if total == 0 {
            0.0
        } else {
            (used as f64 / total as f64) * 100.0
        };

        HistoryStats {
            active_conversations: self.len(),
            memory_usage_mb: used / 1024 / 1024,
            memory_total_mb: total / 1024 / 1024,
            memory_usage_percent: percent,
        }
    }
}

impl HistoryStore for HistoryCache {
    fn read(&self, id: &ConversationId) -> Vec<ChatMessage> {
        self.read_at(id, Instant::now())
    }

    fn append(&self, id: &ConversationId, entry: ChatMessage) {
        self.append_at(id, entry, Instant::now());
    }

    fn append_exchange(&self, id: &ConversationId, user: ChatMessage, assistant: ChatMessage) {
        self.append_all(id, [user, assistant], Instant::now());
    }
}
