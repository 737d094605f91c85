//! # Query Builder Controller
//!
//! Owns the filter being edited, the last matched set and the workflow
//! state. Every user action is a method here; the presentation layer reads
//! the result through the accessors and never touches the state directly.
//!
//! ```text
//! Editing --preview--> Previewed --request--> Confirming --confirm--> Executing
//!    ^                     |  ^                    |                      |
//!    +------ edit ---------+  +------ cancel ------+                      |
//!                             +------- report + silent re-preview --------+
//! ```

use super::executor;
use super::WorkflowState;
use crate::config::Config;
use crate::connectors::{SnapshotProvider, StreamMutator};
use crate::error::{GuardViolation, HubError, Result};
use crate::presets::{PresetStore, SavedFilterPreset};
use chrono::Utc;
use jd_core::{
    evaluate, sort, AgeOp, AgeUnit, BulkAction, BulkActionReport, ConfirmPrompt, CountOp,
    Predicate, SortColumn, SortState, StreamSummary,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Refuse every delete/purge request.
    pub read_only: bool,
    /// Upper bound on one snapshot fetch.
    pub snapshot_timeout: Duration,
    /// Block preview when a clause value cannot be parsed instead of
    /// skipping that clause.
    pub strict_values: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            snapshot_timeout: Duration::from_secs(5),
            strict_values: false,
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            read_only: config.read_only,
            snapshot_timeout: config.snapshot_timeout(),
            strict_values: config.strict_filter_values,
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn strict_values(mut self, strict: bool) -> Self {
        self.strict_values = strict;
        self
    }

    pub fn snapshot_timeout(mut self, timeout: Duration) -> Self {
        self.snapshot_timeout = timeout;
        self
    }
}

pub struct QueryController {
    provider: Arc<dyn SnapshotProvider>,
    mutator: Arc<dyn StreamMutator>,
    presets: Arc<dyn PresetStore>,
    options: ControllerOptions,
    state: WorkflowState,
    predicate: Predicate,
    matched: Vec<StreamSummary>,
    /// `None` while the matched set is in snapshot order.
    sort_state: Option<SortState>,
    prompt: Option<ConfirmPrompt>,
    in_flight: Option<oneshot::Receiver<BulkActionReport>>,
    last_report: Option<BulkActionReport>,
}

impl QueryController {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        mutator: Arc<dyn StreamMutator>,
        presets: Arc<dyn PresetStore>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            provider,
            mutator,
            presets,
            options,
            state: WorkflowState::Editing,
            predicate: Predicate::default(),
            matched: Vec::new(),
            sort_state: None,
            prompt: None,
            in_flight: None,
            last_report: None,
        }
    }

    // --- accessors ---

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn matched(&self) -> &[StreamSummary] {
        &self.matched
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort_state
    }

    pub fn last_report(&self) -> Option<&BulkActionReport> {
        self.last_report.as_ref()
    }

    pub fn pending_prompt(&self) -> Option<&ConfirmPrompt> {
        self.prompt.as_ref()
    }

    pub fn is_read_only(&self) -> bool {
        self.options.read_only
    }

    // --- filter edits ---

    pub fn set_name_pattern(&mut self, pattern: impl Into<String>) -> Result<()> {
        self.begin_edit()?;
        self.predicate.name_pattern = pattern.into();
        Ok(())
    }

    pub fn set_age(&mut self, op: AgeOp, value: impl Into<String>, unit: AgeUnit) -> Result<()> {
        self.begin_edit()?;
        self.predicate.age_op = op;
        self.predicate.age_value = value.into();
        self.predicate.age_unit = unit;
        Ok(())
    }

    pub fn set_consumers(&mut self, op: CountOp, value: impl Into<String>) -> Result<()> {
        self.begin_edit()?;
        self.predicate.consumer_op = op;
        self.predicate.consumer_value = value.into();
        Ok(())
    }

    pub fn set_messages(&mut self, op: CountOp, value: impl Into<String>) -> Result<()> {
        self.begin_edit()?;
        self.predicate.messages_op = op;
        self.predicate.messages_value = value.into();
        Ok(())
    }

    pub fn set_predicate(&mut self, predicate: Predicate) -> Result<()> {
        self.begin_edit()?;
        self.predicate = predicate;
        Ok(())
    }

    /// Reset every clause to "any" and drop the matched set.
    pub fn clear(&mut self) -> Result<()> {
        self.begin_edit()?;
        self.predicate = Predicate::default();
        self.matched.clear();
        self.sort_state = None;
        Ok(())
    }

    fn begin_edit(&mut self) -> Result<()> {
        match self.state {
            WorkflowState::Executing(_) => return Err(self.invalid("edit the filter")),
            WorkflowState::Confirming(action) => debug!("Discarding pending {}", action),
            _ => {}
        }
        self.prompt = None;
        self.state = WorkflowState::Editing;
        Ok(())
    }

    // --- preview & sort ---

    /// Evaluate the filter against a fresh snapshot. Returns the match count.
    ///
    /// On failure the state and the matched set are left as they were.
    pub async fn preview(&mut self) -> Result<usize> {
        if !self.state.is_idle() {
            return Err(self.invalid("preview"));
        }
        if self.options.strict_values {
            let invalid = self.predicate.invalid_clauses();
            if !invalid.is_empty() {
                return Err(HubError::InvalidFilter(invalid));
            }
        }
        self.refresh().await?;
        Ok(self.matched.len())
    }

    async fn refresh(&mut self) -> Result<()> {
        let snapshot = self.fetch_snapshot().await?;
        let matched = evaluate(&self.predicate, &snapshot, Utc::now());
        debug!(
            "Preview matched {} of {} streams ({})",
            matched.len(),
            snapshot.len(),
            self.predicate.describe()
        );
        self.matched = matched;
        self.sort_state = None;
        self.state = WorkflowState::Previewed;
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<Vec<StreamSummary>> {
        let timeout = self.options.snapshot_timeout;
        match tokio::time::timeout(timeout, self.provider.list_streams()).await {
            Ok(Ok(streams)) => Ok(streams),
            Ok(Err(e)) => Err(HubError::Snapshot(e.to_string())),
            Err(_) => Err(HubError::SnapshotTimeout(timeout)),
        }
    }

    /// Sort the held matched set by `column`, flipping direction when it is
    /// already the sort column.
    ///
    /// A preview leaves the set in snapshot order with no sort column, so
    /// the first toggle after a preview always sorts ascending, `Name`
    /// included.
    pub fn toggle_sort(&mut self, column: SortColumn) -> Result<SortState> {
        if !self.state.is_idle() {
            return Err(self.invalid("sort"));
        }
        let next = match self.sort_state {
            Some(mut current) => {
                current.toggle(column);
                current
            }
            None => SortState {
                column,
                ascending: true,
            },
        };
        sort(&mut self.matched, next);
        self.sort_state = Some(next);
        Ok(next)
    }

    // --- bulk actions ---

    /// Ask to run `action` on the matched set. On success the returned
    /// prompt must be answered with [`confirm`](Self::confirm) or
    /// [`cancel`](Self::cancel).
    pub fn request(&mut self, action: BulkAction) -> Result<ConfirmPrompt> {
        match self.state {
            WorkflowState::Executing(_) => return Err(GuardViolation::Busy.into()),
            WorkflowState::Confirming(_) => return Err(self.invalid("request a bulk action")),
            WorkflowState::Editing => return Err(GuardViolation::NotPreviewed.into()),
            WorkflowState::Previewed => {}
        }
        if self.matched.is_empty() {
            return Err(GuardViolation::EmptyMatchedSet.into());
        }
        if self.options.read_only {
            return Err(GuardViolation::ReadOnly.into());
        }

        let prompt = ConfirmPrompt::new(action, &self.matched);
        self.prompt = Some(prompt.clone());
        self.state = WorkflowState::Confirming(action);
        Ok(prompt)
    }

    pub fn cancel(&mut self) -> Result<()> {
        let WorkflowState::Confirming(action) = self.state else {
            return Err(self.invalid("cancel"));
        };
        debug!("Cancelled bulk {}", action);
        self.prompt = None;
        self.state = WorkflowState::Previewed;
        Ok(())
    }

    /// Start the confirmed action on a background task.
    pub fn confirm(&mut self) -> Result<()> {
        let WorkflowState::Confirming(action) = self.state else {
            return Err(self.invalid("confirm"));
        };
        info!(
            "Confirmed bulk {} of {} streams ({})",
            action,
            self.matched.len(),
            self.predicate.describe()
        );
        let rx = executor::spawn(self.mutator.clone(), action, self.matched.clone());
        self.in_flight = Some(rx);
        self.prompt = None;
        self.state = WorkflowState::Executing(action);
        Ok(())
    }

    /// Non-blocking check for a finished bulk run. `Ok(None)` when nothing
    /// is running or the run has not reported yet.
    pub async fn poll_bulk(&mut self) -> Result<Option<BulkActionReport>> {
        let WorkflowState::Executing(action) = self.state else {
            return Ok(None);
        };
        let outcome = self
            .in_flight
            .as_mut()
            .map(|rx| rx.try_recv())
            .unwrap_or(Err(TryRecvError::Closed));
        match outcome {
            Ok(report) => self.finish(report).await.map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => Err(self.abort(action)),
        }
    }

    /// Wait for the running bulk action to report.
    ///
    /// Cancel-safe: dropping the future leaves the run in flight and the
    /// controller in `Executing`.
    pub async fn wait_bulk(&mut self) -> Result<BulkActionReport> {
        let WorkflowState::Executing(action) = self.state else {
            return Err(self.invalid("wait for a bulk action"));
        };
        let outcome = match self.in_flight.as_mut() {
            Some(rx) => Some(rx.await),
            None => None,
        };
        match outcome {
            Some(Ok(report)) => self.finish(report).await,
            _ => Err(self.abort(action)),
        }
    }

    async fn finish(&mut self, report: BulkActionReport) -> Result<BulkActionReport> {
        self.in_flight = None;
        self.last_report = Some(report.clone());
        // The run is over; until the refresh lands the old set is stale.
        self.matched.clear();
        self.sort_state = None;
        self.state = WorkflowState::Editing;
        if let Err(e) = self.refresh().await {
            warn!("Refresh after bulk {} failed: {}", report.action, e);
        }
        Ok(report)
    }

    fn abort(&mut self, action: BulkAction) -> HubError {
        warn!("Bulk {} ended without a report", action);
        self.in_flight = None;
        self.matched.clear();
        self.sort_state = None;
        self.state = WorkflowState::Editing;
        HubError::BulkAborted(action)
    }

    // --- presets ---

    /// Store the current filter under `name`. Does not change the state.
    pub async fn save_preset(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HubError::PresetNameEmpty);
        }
        let preset = SavedFilterPreset::from_predicate(name, &self.predicate);
        self.presets.save_preset(preset).await?;
        info!("Saved filter '{}'", name);
        Ok(())
    }

    pub async fn list_presets(&self) -> Result<Vec<SavedFilterPreset>> {
        self.presets.load_presets().await
    }

    /// Replace the filter with a saved one and preview it.
    pub async fn load_preset(&mut self, name: &str) -> Result<usize> {
        if !self.state.is_idle() {
            return Err(self.invalid("load a filter"));
        }
        let preset = self
            .presets
            .load_presets()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| HubError::PresetNotFound(name.to_string()))?;

        self.predicate = preset.to_predicate();
        self.state = WorkflowState::Editing;
        info!("Loaded filter '{}': {}", name, self.predicate.describe());
        self.preview().await
    }

    fn invalid(&self, action: &'static str) -> HubError {
        HubError::InvalidTransition {
            state: self.state.to_string(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::memory::MemoryCluster;
    use crate::presets::MemoryPresetStore;
    use chrono::Duration as ChronoDuration;
    use jd_core::Clause;

    fn snapshot() -> Vec<StreamSummary> {
        let now = Utc::now();
        vec![
            StreamSummary::new("order-processing", now - ChronoDuration::hours(30))
                .with_messages(150)
                .with_consumers(2),
            StreamSummary::new("order-archive", now - ChronoDuration::hours(2))
                .with_messages(50),
            StreamSummary::new("user-events", now - ChronoDuration::hours(5))
                .with_messages(300)
                .with_consumers(1),
        ]
    }

    fn setup(options: ControllerOptions) -> (Arc<MemoryCluster>, QueryController) {
        let cluster = Arc::new(MemoryCluster::new(snapshot()));
        let controller = QueryController::new(
            cluster.clone(),
            cluster.clone(),
            Arc::new(MemoryPresetStore::new()),
            options,
        );
        (cluster, controller)
    }

    fn names(streams: &[StreamSummary]) -> Vec<&str> {
        streams.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_preview_order_streams_with_many_messages() {
        let (_, mut c) = setup(ControllerOptions::default());
        c.set_name_pattern("order-*").unwrap();
        c.set_messages(CountOp::GreaterThan, "100").unwrap();
        assert_eq!(c.preview().await.unwrap(), 1);
        assert_eq!(c.state(), WorkflowState::Previewed);
        assert_eq!(names(c.matched()), vec!["order-processing"]);
    }

    #[tokio::test]
    async fn test_request_without_preview_is_rejected() {
        let (cluster, mut c) = setup(ControllerOptions::default());
        let err = c.request(BulkAction::Delete).unwrap_err();
        assert!(matches!(err, HubError::Guard(GuardViolation::NotPreviewed)));
        assert_eq!(c.state(), WorkflowState::Editing);
        assert!(cluster.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_request_on_empty_preview_is_rejected() {
        let (cluster, mut c) = setup(ControllerOptions::default());
        c.set_name_pattern("nothing-*").unwrap();
        assert_eq!(c.preview().await.unwrap(), 0);
        let err = c.request(BulkAction::Purge).unwrap_err();
        assert!(matches!(err, HubError::Guard(GuardViolation::EmptyMatchedSet)));
        assert_eq!(c.state(), WorkflowState::Previewed);
        assert!(cluster.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_only_rejects_regardless_of_matches() {
        let (cluster, mut c) = setup(ControllerOptions::default().read_only(true));
        assert_eq!(c.preview().await.unwrap(), 3);
        let err = c.request(BulkAction::Delete).unwrap_err();
        assert!(matches!(err, HubError::Guard(GuardViolation::ReadOnly)));
        assert!(c.pending_prompt().is_none());
        assert!(cluster.calls().await.is_empty());
        assert_eq!(cluster.streams().await.len(), 3);
    }

    #[tokio::test]
    async fn test_edit_after_preview_makes_set_stale() {
        let (_, mut c) = setup(ControllerOptions::default());
        c.preview().await.unwrap();
        c.set_consumers(CountOp::Equal, "0").unwrap();
        assert_eq!(c.state(), WorkflowState::Editing);
        let err = c.request(BulkAction::Delete).unwrap_err();
        assert!(matches!(err, HubError::Guard(GuardViolation::NotPreviewed)));
    }

    #[tokio::test]
    async fn test_edit_while_confirming_discards_request() {
        let (cluster, mut c) = setup(ControllerOptions::default());
        c.preview().await.unwrap();
        c.request(BulkAction::Delete).unwrap();
        assert!(c.pending_prompt().is_some());
        c.set_name_pattern("user-*").unwrap();
        assert_eq!(c.state(), WorkflowState::Editing);
        assert!(c.pending_prompt().is_none());
        assert!(c.confirm().is_err());
        assert!(cluster.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_returns_to_previewed() {
        let (cluster, mut c) = setup(ControllerOptions::default());
        c.preview().await.unwrap();
        let prompt = c.request(BulkAction::Purge).unwrap();
        assert_eq!(prompt.total, 3);
        c.cancel().unwrap();
        assert_eq!(c.state(), WorkflowState::Previewed);
        assert!(c.pending_prompt().is_none());
        assert!(cluster.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_and_re_previews() {
        let (cluster, mut c) = setup(ControllerOptions::default());
        c.set_name_pattern("order-*").unwrap();
        c.preview().await.unwrap();
        c.request(BulkAction::Delete).unwrap();
        c.confirm().unwrap();
        assert_eq!(c.state(), WorkflowState::Executing(BulkAction::Delete));

        let report = c.wait_bulk().await.unwrap();
        assert_eq!((report.attempted, report.succeeded, report.failed), (2, 2, 0));
        assert_eq!(c.state(), WorkflowState::Previewed);
        assert!(c.matched().is_empty());
        assert_eq!(c.last_report(), Some(&report));
        assert_eq!(names(&cluster.streams().await), vec!["user-events"]);
    }

    #[tokio::test]
    async fn test_executing_rejects_requests_and_edits() {
        let cluster = Arc::new(
            MemoryCluster::new(snapshot()).with_latency(std::time::Duration::from_millis(30)),
        );
        let mut c = QueryController::new(
            cluster.clone(),
            cluster.clone(),
            Arc::new(MemoryPresetStore::new()),
            ControllerOptions::default(),
        );
        c.preview().await.unwrap();
        c.request(BulkAction::Purge).unwrap();
        c.confirm().unwrap();

        assert!(matches!(
            c.request(BulkAction::Delete),
            Err(HubError::Guard(GuardViolation::Busy))
        ));
        assert!(matches!(
            c.set_name_pattern("x"),
            Err(HubError::InvalidTransition { .. })
        ));
        assert!(matches!(c.preview().await, Err(HubError::InvalidTransition { .. })));
        assert!(c.toggle_sort(SortColumn::Name).is_err());

        let report = c.wait_bulk().await.unwrap();
        assert_eq!(report.succeeded, 3);
        assert_eq!(cluster.calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_dropped_wait_keeps_run_in_flight() {
        let cluster = Arc::new(
            MemoryCluster::new(snapshot()).with_latency(std::time::Duration::from_millis(40)),
        );
        let mut c = QueryController::new(
            cluster.clone(),
            cluster.clone(),
            Arc::new(MemoryPresetStore::new()),
            ControllerOptions::default(),
        );
        c.preview().await.unwrap();
        c.request(BulkAction::Purge).unwrap();
        c.confirm().unwrap();

        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(1), c.wait_bulk()).await;
        assert!(waited.is_err());
        assert_eq!(c.state(), WorkflowState::Executing(BulkAction::Purge));
        assert_eq!(c.poll_bulk().await.unwrap(), None);
        assert!(matches!(
            c.request(BulkAction::Delete),
            Err(HubError::Guard(GuardViolation::Busy))
        ));

        let report = c.wait_bulk().await.unwrap();
        assert_eq!(report.attempted, 3);
        assert_eq!(c.state(), WorkflowState::Previewed);
        let calls = cluster.calls().await;
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(action, _)| *action == BulkAction::Purge));
    }

    #[tokio::test]
    async fn test_first_toggle_after_preview_is_ascending() {
        let (_, mut c) = setup(ControllerOptions::default());
        c.preview().await.unwrap();
        let state = c.toggle_sort(SortColumn::Name).unwrap();
        assert!(state.ascending);
        assert_eq!(
            names(c.matched()),
            vec!["order-archive", "order-processing", "user-events"]
        );
        assert!(!c.toggle_sort(SortColumn::Name).unwrap().ascending);

        c.preview().await.unwrap();
        assert!(c.toggle_sort(SortColumn::Name).unwrap().ascending);
    }

    #[tokio::test]
    async fn test_poll_until_report() {
        let cluster = Arc::new(
            MemoryCluster::new(snapshot()).with_latency(std::time::Duration::from_millis(10)),
        );
        let mut c = QueryController::new(
            cluster.clone(),
            cluster,
            Arc::new(MemoryPresetStore::new()),
            ControllerOptions::default(),
        );
        c.preview().await.unwrap();
        c.request(BulkAction::Purge).unwrap();
        c.confirm().unwrap();
        assert_eq!(c.poll_bulk().await.unwrap(), None);

        let report = loop {
            if let Some(report) = c.poll_bulk().await.unwrap() {
                break report;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        };
        assert_eq!(report.attempted, 3);
        assert_eq!(c.state(), WorkflowState::Previewed);
        assert!(c.matched().iter().all(|s| s.messages == 0));
        assert_eq!(c.poll_bulk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_refresh_after_bulk_drops_to_editing() {
        let (cluster, mut c) = setup(ControllerOptions::default());
        c.preview().await.unwrap();
        c.request(BulkAction::Purge).unwrap();
        c.confirm().unwrap();
        cluster.fail_listing(true);

        let report = c.wait_bulk().await.unwrap();
        assert_eq!(report.succeeded, 3);
        assert_eq!(c.state(), WorkflowState::Editing);
        assert!(c.matched().is_empty());
        assert!(c.last_report().is_some());
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_state() {
        let (cluster, mut c) = setup(ControllerOptions::default());
        c.preview().await.unwrap();
        cluster.fail_listing(true);
        assert!(matches!(c.preview().await, Err(HubError::Snapshot(_))));
        assert_eq!(c.state(), WorkflowState::Previewed);
        assert_eq!(c.matched().len(), 3);
    }

    #[tokio::test]
    async fn test_snapshot_timeout() {
        let cluster = Arc::new(
            MemoryCluster::new(snapshot()).with_latency(std::time::Duration::from_millis(200)),
        );
        let mut c = QueryController::new(
            cluster.clone(),
            cluster,
            Arc::new(MemoryPresetStore::new()),
            ControllerOptions::default().snapshot_timeout(std::time::Duration::from_millis(20)),
        );
        assert!(matches!(c.preview().await, Err(HubError::SnapshotTimeout(_))));
        assert_eq!(c.state(), WorkflowState::Editing);
    }

    #[tokio::test]
    async fn test_sort_toggles_and_preview_resets() {
        let (_, mut c) = setup(ControllerOptions::default());
        c.preview().await.unwrap();
        assert_eq!(c.sort_state(), None);

        c.toggle_sort(SortColumn::Messages).unwrap();
        assert_eq!(
            names(c.matched()),
            vec!["order-archive", "order-processing", "user-events"]
        );
        let desc = c.toggle_sort(SortColumn::Messages).unwrap();
        assert!(!desc.ascending);
        assert_eq!(
            names(c.matched()),
            vec!["user-events", "order-processing", "order-archive"]
        );

        c.preview().await.unwrap();
        assert_eq!(c.sort_state(), None);
        assert_eq!(
            names(c.matched()),
            vec!["order-processing", "order-archive", "user-events"]
        );
    }

    #[tokio::test]
    async fn test_unparseable_value_skips_clause_by_default() {
        let (_, mut c) = setup(ControllerOptions::default());
        c.set_messages(CountOp::GreaterThan, "many").unwrap();
        assert_eq!(c.preview().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_strict_mode_blocks_unparseable_value() {
        let (_, mut c) = setup(ControllerOptions::default().strict_values(true));
        c.set_messages(CountOp::GreaterThan, "many").unwrap();
        match c.preview().await {
            Err(HubError::InvalidFilter(clauses)) => assert_eq!(clauses, vec![Clause::Messages]),
            other => panic!("expected InvalidFilter, got {:?}", other.map(|_| ())),
        }
        assert_eq!(c.state(), WorkflowState::Editing);
    }

    #[tokio::test]
    async fn test_clear_resets_filter_and_matches() {
        let (_, mut c) = setup(ControllerOptions::default());
        c.set_name_pattern("order-*").unwrap();
        c.preview().await.unwrap();
        c.clear().unwrap();
        assert!(c.predicate().is_match_all());
        assert!(c.matched().is_empty());
        assert_eq!(c.state(), WorkflowState::Editing);
    }

    #[tokio::test]
    async fn test_save_and_load_preset() {
        let (_, mut c) = setup(ControllerOptions::default());
        c.set_name_pattern("order-*").unwrap();
        c.set_age(AgeOp::GreaterThan, "24", AgeUnit::Hours).unwrap();
        c.save_preset("stale-orders").await.unwrap();
        assert_eq!(c.state(), WorkflowState::Editing);

        c.clear().unwrap();
        assert_eq!(c.load_preset("stale-orders").await.unwrap(), 1);
        assert_eq!(c.state(), WorkflowState::Previewed);
        assert_eq!(c.predicate().name_pattern, "order-*");
        assert_eq!(names(c.matched()), vec!["order-processing"]);
    }

    #[tokio::test]
    async fn test_preset_errors() {
        let (_, mut c) = setup(ControllerOptions::default());
        assert!(matches!(c.save_preset("  ").await, Err(HubError::PresetNameEmpty)));
        assert!(c.list_presets().await.unwrap().is_empty());
        assert!(matches!(
            c.load_preset("missing").await,
            Err(HubError::PresetNotFound(_))
        ));

        c.save_preset("a").await.unwrap();
        assert!(matches!(c.save_preset("a").await, Err(HubError::PresetExists(_))));
        assert_eq!(c.list_presets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_allowed_while_confirming() {
        let (_, mut c) = setup(ControllerOptions::default());
        c.preview().await.unwrap();
        c.request(BulkAction::Delete).unwrap();
        c.save_preset("everything").await.unwrap();
        assert_eq!(c.state(), WorkflowState::Confirming(BulkAction::Delete));
        assert!(matches!(
            c.load_preset("everything").await,
            Err(HubError::InvalidTransition { .. })
        ));
    }
}
