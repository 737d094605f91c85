//! # jd-core — The "Model" of JETDECK
//!
//! Pure, synchronous building blocks of the bulk-operations query builder.
//! Nothing in this crate performs I/O: a snapshot of [`StreamSummary`]
//! values goes in, a matched and ordered subset comes out.
//!
//! - [`predicate`] — the operator-editable filter form.
//! - [`filter`] — compiles a [`Predicate`] and evaluates it against a snapshot.
//! - [`sort`] — column ordering of a matched set.
//! - [`report`] — bulk action kinds, confirmation prompts and result tallies.

pub mod filter;
pub mod format;
pub mod glob;
pub mod predicate;
pub mod report;
pub mod sort;
pub mod stream;

pub use filter::{evaluate, CompiledPredicate};
pub use predicate::{AgeOp, AgeUnit, Clause, CountOp, Predicate};
pub use report::{BulkAction, BulkActionReport, ConfirmPrompt};
pub use sort::{sort, SortColumn, SortState};
pub use stream::StreamSummary;
