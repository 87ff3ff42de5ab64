use chrono::{DateTime, Utc};

/// A single published message.
///
/// Stamped once at publish time and never mutated afterwards; the topic's
/// history and any in-flight delivery actions share it by value.
#[derive(Debug, Clone)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub sender: String,
    pub payload: String,
}

impl Message {
    pub fn new(sender: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            sender: sender.into(),
            payload: payload.into(),
        }
    }
}
