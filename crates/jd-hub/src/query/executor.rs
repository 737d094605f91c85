//! # Bulk Action Executor
//!
//! Applies one [`BulkAction`] to every stream of a matched set, in order.
//! A failing stream is counted and logged; the run always covers the full
//! set. Read-only and empty-set checks belong to the caller.

use crate::connectors::StreamMutator;
use chrono::Utc;
use jd_core::{BulkAction, BulkActionReport, StreamSummary};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;

/// Run `action` against each stream sequentially.
pub async fn execute(
    mutator: Arc<dyn StreamMutator>,
    action: BulkAction,
    streams: Vec<StreamSummary>,
) -> BulkActionReport {
    let id = format!("bulk-{}", Uuid::new_v4().simple());
    let start = Instant::now();
    let mut report = BulkActionReport::new(id, action, Utc::now());

    info!(id = %report.id, "Starting bulk {} of {} streams", action, streams.len());

    for stream in &streams {
        match mutator.apply(action, &stream.name).await {
            Ok(()) => report.record_success(),
            Err(e) => {
                warn!(id = %report.id, stream = %stream.name, "Failed to {} stream: {}", action, e);
                report.record_failure(&stream.name);
            }
        }
    }

    report.finished_at = Utc::now();
    info!(
        id = %report.id,
        "Bulk {} finished: {} succeeded, {} failed in {}ms",
        action,
        report.succeeded,
        report.failed,
        start.elapsed().as_millis()
    );
    report
}

/// Run [`execute`] on a background task. The receiver yields exactly one
/// report, or an error if the task died before finishing.
pub fn spawn(
    mutator: Arc<dyn StreamMutator>,
    action: BulkAction,
    streams: Vec<StreamSummary>,
) -> oneshot::Receiver<BulkActionReport> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let report = execute(mutator, action, streams).await;
        // The controller may have been dropped; nobody to tell.
        let _ = tx.send(report);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::memory::MemoryCluster;
    use chrono::TimeZone;

    fn streams(names: &[&str]) -> Vec<StreamSummary> {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        names
            .iter()
            .map(|n| StreamSummary::new(*n, t).with_messages(10))
            .collect()
    }

    #[tokio::test]
    async fn test_middle_failure_does_not_stop_the_run() {
        let set = streams(&["a", "b", "c"]);
        let cluster = Arc::new(MemoryCluster::new(set.clone()));
        cluster.fail_stream("b").await;

        let report = execute(cluster.clone(), BulkAction::Delete, set).await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_streams, vec!["b"]);
        assert!(report.id.starts_with("bulk-"));

        let calls: Vec<String> = cluster.calls().await.into_iter().map(|(_, n)| n).collect();
        assert_eq!(calls, vec!["a", "b", "c"]);
        let left: Vec<String> = cluster.streams().await.into_iter().map(|s| s.name).collect();
        assert_eq!(left, vec!["b"]);
    }

    #[tokio::test]
    async fn test_follows_given_order() {
        let set = streams(&["z", "m", "a"]);
        let cluster = Arc::new(MemoryCluster::new(set.clone()));
        execute(cluster.clone(), BulkAction::Purge, set).await;
        let calls = cluster.calls().await;
        assert_eq!(
            calls,
            vec![
                (BulkAction::Purge, "z".to_string()),
                (BulkAction::Purge, "m".to_string()),
                (BulkAction::Purge, "a".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_set_yields_empty_report() {
        let cluster = Arc::new(MemoryCluster::new(Vec::new()));
        let report = execute(cluster, BulkAction::Purge, Vec::new()).await;
        assert_eq!(report.attempted, 0);
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_spawn_reports_through_channel() {
        let set = streams(&["a", "b"]);
        let cluster = Arc::new(MemoryCluster::new(set.clone()));
        let report = spawn(cluster, BulkAction::Purge, set).await.unwrap();
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.summary(), "Bulk Purge Complete\n\nPurged: 2 streams\nFailed: 0 streams");
    }

    #[tokio::test]
    async fn test_each_run_gets_a_fresh_id() {
        let cluster = Arc::new(MemoryCluster::new(Vec::new()));
        let a = execute(cluster.clone(), BulkAction::Delete, Vec::new()).await;
        let b = execute(cluster, BulkAction::Delete, Vec::new()).await;
        assert_ne!(a.id, b.id);
    }
}
