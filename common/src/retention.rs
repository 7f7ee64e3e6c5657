use crate::message::{Message, Timestamp};

/// Maximum number of messages kept in history.
pub const MAX_MESSAGES: usize = 100;

/// Maximum age of a retained message, in seconds (one day).
pub const MAX_AGE_SECONDS: f64 = 86_400.0;

/// Age and count limits applied lazily on every read and write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    pub max_messages: usize,
    pub max_age_seconds: f64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_messages: MAX_MESSAGES,
            max_age_seconds: MAX_AGE_SECONDS,
        }
    }
}

impl RetentionPolicy {
    pub fn new(max_messages: usize, max_age_seconds: f64) -> Self {
        Self {
            max_messages,
            max_age_seconds,
        }
    }

    /// Return `messages` with expired entries dropped and, if still over the
    /// count limit, only the most recent `max_messages` kept.
    pub fn enforce(&self, mut messages: Vec<Message>, now: Timestamp) -> Vec<Message> {
        self.enforce_in_place(&mut messages, now);
        messages
    }

    /// In-place variant of [`enforce`](Self::enforce). Returns how many
    /// messages were evicted.
    pub fn enforce_in_place(&self, messages: &mut Vec<Message>, now: Timestamp) -> usize {
        let before = messages.len();
        messages.retain(|m| m.age(now) <= self.max_age_seconds);
        if messages.len() > self.max_messages {
            let excess = messages.len() - self.max_messages;
            messages.drain(..excess);
        }
        before - messages.len()
    }
}

/// Apply the default policy.
pub fn enforce(messages: Vec<Message>, now: Timestamp) -> Vec<Message> {
    RetentionPolicy::default().enforce(messages, now)
}
