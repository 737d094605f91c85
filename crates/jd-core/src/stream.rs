//! Stream summaries as delivered by a snapshot provider.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One stream as seen by the query builder.
///
/// Immutable within one preview cycle; the name is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub name: String,
    /// Timestamp of the first message still held by the stream.
    pub first_time: DateTime<Utc>,
    pub messages: u64,
    pub bytes: u64,
    pub consumers: usize,
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl StreamSummary {
    pub fn new(name: impl Into<String>, first_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            first_time,
            messages: 0,
            bytes: 0,
            consumers: 0,
            subjects: Vec::new(),
        }
    }

    pub fn with_messages(mut self, messages: u64) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_bytes(mut self, bytes: u64) -> Self {
        self.bytes = bytes;
        self
    }

    pub fn with_consumers(mut self, consumers: usize) -> Self {
        self.consumers = consumers;
        self
    }

    pub fn with_subjects(mut self, subjects: Vec<String>) -> Self {
        self.subjects = subjects;
        self
    }

    /// Raw age relative to `now`. Negative when the clock of the server is
    /// ahead of ours.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.first_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_is_now_minus_first_time() {
        let now = Utc::now();
        let s = StreamSummary::new("orders", now - Duration::minutes(90));
        assert_eq!(s.age(now), Duration::minutes(90));
    }

    #[test]
    fn test_subjects_default_when_missing_from_json() {
        let json = r#"{
            "name": "orders",
            "first_time": "2026-01-01T00:00:00Z",
            "messages": 10,
            "bytes": 2048,
            "consumers": 2
        }"#;
        let s: StreamSummary = serde_json::from_str(json).unwrap();
        assert_eq!(s.messages, 10);
        assert!(s.subjects.is_empty());
    }
}
