//! # Result Sorter
//!
//! View-only reordering of a matched set. Sorting never re-queries the
//! snapshot.

use crate::stream::StreamSummary;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Preview table columns, in display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    Name = 0,
    /// Ordered by first-message time, not by the rendered age.
    Age = 1,
    Messages = 2,
    Consumers = 3,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [Self::Name, Self::Age, Self::Messages, Self::Consumers];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn header(&self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Age => "AGE",
            Self::Messages => "MSGS",
            Self::Consumers => "CONSUMERS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: SortColumn,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SortColumn::Name,
            ascending: true,
        }
    }
}

impl SortState {
    /// Same column flips direction; a new column starts ascending.
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == column {
            self.ascending = !self.ascending;
        } else {
            self.column = column;
            self.ascending = true;
        }
    }
}

fn compare(a: &StreamSummary, b: &StreamSummary, column: SortColumn) -> Ordering {
    let primary = match column {
        SortColumn::Name => a.name.cmp(&b.name),
        SortColumn::Age => a.first_time.cmp(&b.first_time),
        SortColumn::Messages => a.messages.cmp(&b.messages),
        SortColumn::Consumers => a.consumers.cmp(&b.consumers),
    };
    // Names are unique, so ties resolve to a total order.
    primary.then_with(|| a.name.cmp(&b.name))
}

/// Stable sort of `streams` by `state`.
pub fn sort(streams: &mut [StreamSummary], state: SortState) {
    streams.sort_by(|a, b| {
        let ord = compare(a, b, state.column);
        if state.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}
