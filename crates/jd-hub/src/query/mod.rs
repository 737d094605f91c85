//! # Bulk Query Workflow
//!
//! Preview which streams a filter selects, then delete or purge them in
//! one confirmed batch. [`controller::QueryController`] owns the workflow;
//! [`executor`] runs the batch off the interactive task.

pub mod controller;
pub mod executor;

use jd_core::BulkAction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the query builder is in its preview / confirm / execute cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "action")]
pub enum WorkflowState {
    /// The filter has been edited since the last preview (or never previewed).
    #[default]
    Editing,
    /// The matched set reflects the current filter.
    Previewed,
    /// A bulk action is waiting for the operator's yes/no.
    Confirming(BulkAction),
    /// A bulk action is running.
    Executing(BulkAction),
}

impl WorkflowState {
    /// Editing or Previewed: no confirmation pending, nothing running.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Editing | Self::Previewed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editing => write!(f, "editing"),
            Self::Previewed => write!(f, "previewed"),
            Self::Confirming(action) => write!(f, "confirming {}", action),
            Self::Executing(action) => write!(f, "executing {}", action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(WorkflowState::Editing.to_string(), "editing");
        assert_eq!(
            WorkflowState::Executing(BulkAction::Purge).to_string(),
            "executing purge"
        );
    }

    #[test]
    fn test_idle_states() {
        assert!(WorkflowState::default().is_idle());
        assert!(WorkflowState::Previewed.is_idle());
        assert!(!WorkflowState::Confirming(BulkAction::Delete).is_idle());
    }
}
