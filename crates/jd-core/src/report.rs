//! # Bulk Actions
//!
//! Destructive operations applied to a whole matched set, the confirmation
//! prompt shown before they run and the tally produced after.

use crate::stream::StreamSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many stream names a confirmation prompt lists before summarizing.
pub const PROMPT_NAME_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// Remove the stream and its consumers.
    Delete,
    /// Drop all messages, keep the stream and its consumers.
    Purge,
}

impl BulkAction {
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Delete => "Deleted",
            Self::Purge => "Purged",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Delete => "Delete",
            Self::Purge => "Purge",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Purge => write!(f, "purge"),
        }
    }
}

/// Outcome of one bulk run. Every run produces a fresh report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkActionReport {
    pub id: String,
    pub action: BulkAction,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Names of the streams whose mutation failed, in execution order.
    pub failed_streams: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BulkActionReport {
    pub fn new(id: String, action: BulkAction, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            action,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            failed_streams: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, stream: &str) {
        self.attempted += 1;
        self.failed += 1;
        self.failed_streams.push(stream.to_string());
    }

    pub fn summary(&self) -> String {
        format!(
            "Bulk {} Complete\n\n{}: {} streams\nFailed: {} streams",
            self.action.title(),
            self.action.past_tense(),
            self.succeeded,
            self.failed
        )
    }
}

/// What the operator is asked to confirm before a bulk run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPrompt {
    pub action: BulkAction,
    pub total: usize,
    /// At most [`PROMPT_NAME_LIMIT`] names, in matched-set order.
    pub names: Vec<String>,
    pub remaining: usize,
}

impl ConfirmPrompt {
    pub fn new(action: BulkAction, streams: &[StreamSummary]) -> Self {
        let names: Vec<String> = streams
            .iter()
            .take(PROMPT_NAME_LIMIT)
            .map(|s| s.name.clone())
            .collect();
        Self {
            action,
            total: streams.len(),
            remaining: streams.len().saturating_sub(names.len()),
            names,
        }
    }

    pub fn message(&self) -> String {
        let mut lines: Vec<String> = self.names.iter().map(|n| format!("  - {}", n)).collect();
        if self.remaining > 0 {
            lines.push(format!("  ... and {} more", self.remaining));
        }
        match self.action {
            BulkAction::Delete => format!(
                "Delete {} streams?\n\n{}\n\nThis action cannot be undone!",
                self.total,
                lines.join("\n")
            ),
            BulkAction::Purge => format!(
                "Purge all messages from {} streams?\n\n{}\n\nConsumers will remain, only messages deleted.",
                self.total,
                lines.join("\n")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams(n: usize) -> Vec<StreamSummary> {
        (0..n)
            .map(|i| StreamSummary::new(format!("s{}", i), Utc::now()))
            .collect()
    }

    #[test]
    fn test_report_tally() {
        let mut r = BulkActionReport::new("bulk-1".into(), BulkAction::Delete, Utc::now());
        r.record_success();
        r.record_failure("b");
        r.record_success();
        assert_eq!((r.attempted, r.succeeded, r.failed), (3, 2, 1));
        assert_eq!(r.failed_streams, vec!["b"]);
        assert!(r.summary().contains("Deleted: 2 streams"));
        assert!(r.summary().contains("Failed: 1 streams"));
    }

    #[test]
    fn test_prompt_lists_five_and_summarizes_rest() {
        let p = ConfirmPrompt::new(BulkAction::Delete, &streams(7));
        assert_eq!(p.total, 7);
        assert_eq!(p.names.len(), 5);
        assert_eq!(p.remaining, 2);
        let msg = p.message();
        assert!(msg.starts_with("Delete 7 streams?"));
        assert!(msg.contains("  - s4"));
        assert!(!msg.contains("  - s5"));
        assert!(msg.contains("... and 2 more"));
        assert!(msg.contains("cannot be undone"));
    }

    #[test]
    fn test_purge_prompt_wording() {
        let p = ConfirmPrompt::new(BulkAction::Purge, &streams(2));
        assert_eq!(p.remaining, 0);
        let msg = p.message();
        assert!(msg.starts_with("Purge all messages from 2 streams?"));
        assert!(!msg.contains("more"));
        assert!(msg.contains("Consumers will remain"));
    }
}
