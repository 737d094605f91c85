//! # NATS JetStream Cluster (optional — requires `--features nats`)
//!
//! Lists, deletes and purges JetStream streams through `async-nats`.

use super::{ConnectorError, SnapshotProvider, StreamMutator};
use crate::config::ContextConfig;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use jd_core::StreamSummary;

pub struct NatsCluster {
    name: String,
    js: async_nats::jetstream::Context,
}

impl NatsCluster {
    /// Connect using the server and credentials of a configured context.
    pub async fn connect(context: &ContextConfig) -> Result<Self, ConnectorError> {
        let mut options = async_nats::ConnectOptions::new()
            .name("jetdeck")
            .connection_timeout(std::time::Duration::from_secs(10));

        if let Some(token) = context.token.as_deref().filter(|t| !t.is_empty()) {
            options = options.token(token.to_string());
        }
        if let Some(creds) = context.creds.as_ref() {
            options = options.credentials_file(creds).await?;
        }

        tracing::info!(
            "Connecting to NATS context '{}' at {}",
            context.name,
            context.server
        );
        let client = options.connect(context.server.as_str()).await?;

        Ok(Self {
            name: context.name.clone(),
            js: async_nats::jetstream::new(client),
        })
    }

    pub fn context_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl SnapshotProvider for NatsCluster {
    async fn list_streams(&self) -> Result<Vec<StreamSummary>, ConnectorError> {
        let mut listing = self.js.streams();
        let mut streams = Vec::new();
        while let Some(info) = listing.try_next().await? {
            let first = info.state.first_timestamp;
            let first_time = chrono::DateTime::from_timestamp(first.unix_timestamp(), first.nanosecond())
                .unwrap_or_default();
            streams.push(
                StreamSummary::new(info.config.name.clone(), first_time)
                    .with_messages(info.state.messages)
                    .with_bytes(info.state.bytes)
                    .with_consumers(info.state.consumer_count)
                    .with_subjects(info.config.subjects.clone()),
            );
        }
        Ok(streams)
    }
}

#[async_trait]
impl StreamMutator for NatsCluster {
    async fn delete_stream(&self, name: &str) -> Result<(), ConnectorError> {
        self.js
            .delete_stream(name)
            .await
            .map_err(|e| format!("failed to delete stream: {}", e))?;
        Ok(())
    }

    async fn purge_stream(&self, name: &str) -> Result<(), ConnectorError> {
        let stream = self
            .js
            .get_stream(name)
            .await
            .map_err(|e| format!("failed to purge stream: {}", e))?;
        stream
            .purge()
            .await
            .map_err(|e| format!("failed to purge stream: {}", e))?;
        Ok(())
    }
}
