//! # In-Memory Cluster
//!
//! A self-contained stand-in for a JetStream server. Backs the offline
//! mode of the CLI (streams loaded from a JSON snapshot file) and the test
//! suite, which uses its failure injection and call log.

use super::{ConnectorError, SnapshotProvider, StreamMutator};
use crate::error::{HubError, Result};
use async_trait::async_trait;
use jd_core::{BulkAction, StreamSummary};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

pub struct MemoryCluster {
    streams: RwLock<Vec<StreamSummary>>,
    failing: RwLock<HashSet<String>>,
    listing_fails: AtomicBool,
    latency: Duration,
    calls: RwLock<Vec<(BulkAction, String)>>,
}

impl MemoryCluster {
    pub fn new(streams: Vec<StreamSummary>) -> Self {
        Self {
            streams: RwLock::new(streams),
            failing: RwLock::new(HashSet::new()),
            listing_fails: AtomicBool::new(false),
            latency: Duration::ZERO,
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Load a snapshot written as a JSON array of stream summaries.
    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HubError::Config(format!("{}: {}", path.display(), e)))?;
        let streams: Vec<StreamSummary> = serde_json::from_str(&content)
            .map_err(|e| HubError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Loaded {} streams from {}", streams.len(), path.display());
        Ok(Self::new(streams))
    }

    /// Delay applied to every call, listing included.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every mutation of `name` fail.
    pub async fn fail_stream(&self, name: &str) {
        self.failing.write().await.insert(name.to_string());
    }

    pub fn fail_listing(&self, fail: bool) {
        self.listing_fails.store(fail, Ordering::Relaxed);
    }

    pub async fn streams(&self) -> Vec<StreamSummary> {
        self.streams.read().await.clone()
    }

    /// Every mutation attempted so far, failed ones included.
    pub async fn calls(&self) -> Vec<(BulkAction, String)> {
        self.calls.read().await.clone()
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn begin(&self, action: BulkAction, name: &str) -> std::result::Result<(), ConnectorError> {
        self.pause().await;
        self.calls.write().await.push((action, name.to_string()));
        if self.failing.read().await.contains(name) {
            return Err(format!("failed to {} stream: injected failure for '{}'", action, name).into());
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotProvider for MemoryCluster {
    async fn list_streams(&self) -> std::result::Result<Vec<StreamSummary>, ConnectorError> {
        self.pause().await;
        if self.listing_fails.load(Ordering::Relaxed) {
            return Err("server unavailable".into());
        }
        Ok(self.streams.read().await.clone())
    }
}

#[async_trait]
impl StreamMutator for MemoryCluster {
    async fn delete_stream(&self, name: &str) -> std::result::Result<(), ConnectorError> {
        self.begin(BulkAction::Delete, name).await?;
        let mut streams = self.streams.write().await;
        let idx = streams
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| format!("failed to delete stream: stream '{}' not found", name))?;
        streams.remove(idx);
        Ok(())
    }

    async fn purge_stream(&self, name: &str) -> std::result::Result<(), ConnectorError> {
        self.begin(BulkAction::Purge, name).await?;
        let mut streams = self.streams.write().await;
        let stream = streams
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| format!("failed to purge stream: stream '{}' not found", name))?;
        stream.messages = 0;
        stream.bytes = 0;
        stream.first_time = chrono::Utc::now();
        Ok(())
    }
}
