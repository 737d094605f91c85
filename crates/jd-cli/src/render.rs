//! Plain-text renderings for the terminal.

use chrono::{DateTime, Utc};
use jd_core::format::{format_age, format_bytes, format_count};
use jd_core::{SortState, StreamSummary};
use jd_hub::presets::SavedFilterPreset;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct StreamRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "AGE")]
    age: String,
    #[tabled(rename = "MSGS")]
    messages: String,
    #[tabled(rename = "BYTES")]
    bytes: String,
    #[tabled(rename = "CONSUMERS")]
    consumers: usize,
}

#[derive(Tabled)]
struct PresetRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "FILTER")]
    filter: String,
}

pub fn streams_table(streams: &[StreamSummary], sort: Option<SortState>, now: DateTime<Utc>) -> String {
    if streams.is_empty() {
        return "No streams matched.".to_string();
    }
    let rows = streams.iter().map(|s| StreamRow {
        name: s.name.clone(),
        age: format_age(s.age(now)),
        messages: format_count(s.messages),
        bytes: format_bytes(s.bytes),
        consumers: s.consumers,
    });
    let mut out = Table::new(rows).with(Style::sharp()).to_string();
    out.push_str(&format!("\n{} streams matched", streams.len()));
    if let Some(sort) = sort {
        out.push_str(&format!(
            ", sorted by {} ({})",
            sort.column.header(),
            if sort.ascending { "asc" } else { "desc" }
        ));
    }
    out
}

pub fn presets_table(presets: &[SavedFilterPreset]) -> String {
    if presets.is_empty() {
        return "No saved filters.".to_string();
    }
    let rows = presets.iter().map(|p| PresetRow {
        name: p.name.clone(),
        filter: p.to_predicate().describe(),
    });
    Table::new(rows).with(Style::sharp()).to_string()
}
