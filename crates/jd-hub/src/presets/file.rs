//! TOML-backed preset store.
//!
//! ```toml
//! [[filters]]
//! name = "old-orders"
//! name_pattern = "order-*"
//! age_op = ">"
//! age_value = 24
//! age_unit = "h"
//! consumer_op = "any"
//! messages_op = "any"
//! ```

use super::{PresetStore, SavedFilterPreset};
use crate::error::{HubError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FilterFile {
    #[serde(default)]
    filters: Vec<SavedFilterPreset>,
}

pub struct FilePresetStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FilePresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<FilterFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                HubError::PresetStore(format!("failed to parse {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FilterFile::default()),
            Err(e) => Err(HubError::PresetStore(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write(&self, file: &FilterFile) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                HubError::PresetStore(format!("failed to create {}: {}", dir.display(), e))
            })?;
        }
        let content = toml::to_string_pretty(file)
            .map_err(|e| HubError::PresetStore(format!("failed to encode filters: {}", e)))?;

        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| HubError::PresetStore(format!("failed to write {}: {}", tmp.display(), e)))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(HubError::PresetStore(format!(
                "failed to write {}: {}",
                self.path.display(),
                e
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PresetStore for FilePresetStore {
    async fn load_presets(&self) -> Result<Vec<SavedFilterPreset>> {
        Ok(self.read().await?.filters)
    }

    async fn save_preset(&self, preset: SavedFilterPreset) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read().await?;
        if file.filters.iter().any(|f| f.name == preset.name) {
            return Err(HubError::PresetExists(preset.name));
        }
        tracing::debug!("Saving filter '{}' to {}", preset.name, self.path.display());
        file.filters.push(preset);
        self.write(&file).await
    }
}
