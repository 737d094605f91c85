//! Typed errors for the control center.
//!
//! Every failure here is recoverable: the controller reports it and stays
//! in the state it was in before the failing transition.

use jd_core::{BulkAction, Clause};
use std::time::Duration;
use thiserror::Error;

/// A bulk action request that the workflow refuses outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardViolation {
    #[error("No fresh preview. Press 'Preview Matches' first.")]
    NotPreviewed,
    #[error("No streams matched. Press 'Preview Matches' first.")]
    EmptyMatchedSet,
    #[error("Cannot modify streams in read-only mode")]
    ReadOnly,
    #[error("A bulk action is already in progress")]
    Busy,
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Failed to list streams: {0}")]
    Snapshot(String),

    #[error("Listing streams timed out after {0:?}")]
    SnapshotTimeout(Duration),

    #[error("filter '{0}' already exists")]
    PresetExists(String),

    #[error("filter '{0}' not found")]
    PresetNotFound(String),

    #[error("Filter name cannot be empty")]
    PresetNameEmpty,

    #[error("Preset store error: {0}")]
    PresetStore(String),

    #[error(transparent)]
    Guard(#[from] GuardViolation),

    #[error("Filter values cannot be evaluated: {}", join_clauses(.0))]
    InvalidFilter(Vec<Clause>),

    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: String, action: &'static str },

    #[error("Bulk {0} ended without a report")]
    BulkAborted(BulkAction),

    #[error("Config error: {0}")]
    Config(String),
}

fn join_clauses(clauses: &[Clause]) -> String {
    clauses
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, HubError>;
