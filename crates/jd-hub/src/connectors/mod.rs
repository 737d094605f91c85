//! # Cluster Connectors
//!
//! The query builder reads and mutates a stream cluster through two narrow
//! seams: a [`SnapshotProvider`] that lists every stream, and a
//! [`StreamMutator`] that deletes or purges one stream at a time. The RPC
//! client behind them is someone else's problem.

pub mod memory;

#[cfg(feature = "nats")]
pub mod nats;

use async_trait::async_trait;
use jd_core::{BulkAction, StreamSummary};

/// Error type returned by cluster collaborators.
pub type ConnectorError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies the complete current list of streams.
///
/// Implementations return either the full snapshot or an error; never a
/// partial list.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn list_streams(&self) -> Result<Vec<StreamSummary>, ConnectorError>;
}

/// Applies destructive operations to single streams.
#[async_trait]
pub trait StreamMutator: Send + Sync {
    async fn delete_stream(&self, name: &str) -> Result<(), ConnectorError>;

    async fn purge_stream(&self, name: &str) -> Result<(), ConnectorError>;

    /// Dispatch a [`BulkAction`] for one stream.
    async fn apply(&self, action: BulkAction, name: &str) -> Result<(), ConnectorError> {
        match action {
            BulkAction::Delete => self.delete_stream(name).await,
            BulkAction::Purge => self.purge_stream(name).await,
        }
    }
}
