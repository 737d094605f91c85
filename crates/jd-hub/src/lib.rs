//! # jd-hub — JETDECK Control Center
//!
//! Orchestrates the bulk-operations query builder on top of [`jd_core`]:
//! the collaborators that talk to a stream cluster, the filter preset
//! store, the bulk action executor and the workflow controller that ties
//! them together.

pub mod config;
pub mod connectors;
pub mod error;
pub mod logging;
pub mod presets;
pub mod query;

pub use error::{GuardViolation, HubError, Result};
pub use query::controller::{ControllerOptions, QueryController};
pub use query::WorkflowState;
