//! # Filter Presets
//!
//! Named, persisted predicates. The store keeps an ordered list and
//! refuses a second preset with the same name.

pub mod file;

pub use file::FilePresetStore;

use crate::error::{HubError, Result};
use async_trait::async_trait;
use jd_core::predicate::parse_value;
use jd_core::{AgeOp, AgeUnit, CountOp, Predicate};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The serialized shape of one saved filter.
///
/// Numeric values are stored as integers; a blank or unparseable form
/// value is stored as absent and comes back blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFilterPreset {
    pub name: String,
    #[serde(default = "match_all")]
    pub name_pattern: String,
    #[serde(default)]
    pub age_op: AgeOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_value: Option<i64>,
    #[serde(default)]
    pub age_unit: AgeUnit,
    #[serde(default)]
    pub consumer_op: CountOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_value: Option<i64>,
    #[serde(default)]
    pub messages_op: CountOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages_value: Option<i64>,
}

fn match_all() -> String {
    "*".into()
}

impl SavedFilterPreset {
    pub fn from_predicate(name: impl Into<String>, predicate: &Predicate) -> Self {
        Self {
            name: name.into(),
            name_pattern: predicate.name_pattern.clone(),
            age_op: predicate.age_op,
            age_value: parse_value(&predicate.age_value),
            age_unit: predicate.age_unit,
            consumer_op: predicate.consumer_op,
            consumer_value: parse_value(&predicate.consumer_value),
            messages_op: predicate.messages_op,
            messages_value: parse_value(&predicate.messages_value),
        }
    }

    pub fn to_predicate(&self) -> Predicate {
        let text = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();
        Predicate {
            name_pattern: self.name_pattern.clone(),
            age_op: self.age_op,
            age_value: text(self.age_value),
            age_unit: self.age_unit,
            consumer_op: self.consumer_op,
            consumer_value: text(self.consumer_value),
            messages_op: self.messages_op,
            messages_value: text(self.messages_value),
        }
    }
}

/// Durable list of presets.
#[async_trait]
pub trait PresetStore: Send + Sync {
    /// All presets in save order. No presets is an empty list, not an error.
    async fn load_presets(&self) -> Result<Vec<SavedFilterPreset>>;

    /// Append a preset. Fails with [`HubError::PresetExists`] on a name
    /// collision and leaves the stored list untouched.
    async fn save_preset(&self, preset: SavedFilterPreset) -> Result<()>;
}

/// Process-local store, for runs without a presets file and for tests.
#[derive(Default)]
pub struct MemoryPresetStore {
    presets: RwLock<Vec<SavedFilterPreset>>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresetStore for MemoryPresetStore {
    async fn load_presets(&self) -> Result<Vec<SavedFilterPreset>> {
        Ok(self.presets.read().await.clone())
    }

    async fn save_preset(&self, preset: SavedFilterPreset) -> Result<()> {
        let mut presets = self.presets.write().await;
        if presets.iter().any(|p| p.name == preset.name) {
            return Err(HubError::PresetExists(preset.name));
        }
        presets.push(preset);
        Ok(())
    }
}
