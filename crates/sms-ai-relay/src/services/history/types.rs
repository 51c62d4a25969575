use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::models::chat::ChatMessage;

/// Ordered turns of one conversation, newest last
#[derive(Debug, Clone)]
pub struct HistoryLog {
    messages: VecDeque<ChatMessage>,

    /// Last write time (reads do not refresh it)
    updated_at: Instant,
}

impl HistoryLog {
    pub fn new(now: Instant) -> Self {
        Self {
            messages: VecDeque::new(),
            updated_at: now,
        }
    }

    /// Append one turn, dropping the oldest turns beyond `max_turns`
    pub fn push(&mut self, entry: ChatMessage, max_turns: usize, now: Instant) {
        self.messages.push_back(entry);
        while self.messages.len() > max_turns {
            self.messages.pop_front();
        }
        self.updated_at = now;
    }

    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.updated_at) >= ttl
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }
}

/// History statistics for monitoring
#[derive(Debug, Clone)]
pub struct HistoryStats {
    pub active_conversations: usize,
    pub memory_usage_mb: u64,
    pub memory_total_mb: u64,
    pub memory_usage_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest_first() {
        let now = Instant::now();
        let mut log = HistoryLog::new(now);

        for i in 0..5 {
            log.push(ChatMessage::user(format!("m{}", i)), 3, now);
        }

        let contents: Vec<_> = log.to_vec().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_expiry_is_measured_from_last_write() {
        let start = Instant::now();
        let ttl = Duration::from_secs(60);
        let mut log = HistoryLog::new(start);

        assert!(!log.is_expired(start + Duration::from_secs(59), ttl));
        assert!(log.is_expired(start + ttl, ttl));

        log.push(ChatMessage::user("again"), 20, start + Duration::from_secs(50));
        assert!(!log.is_expired(start + Duration::from_secs(100), ttl));
    }
}
