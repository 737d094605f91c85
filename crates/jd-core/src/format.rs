//! Compact renderings used by the preview table.

use chrono::Duration;

/// `45s`, `12m`, `30h`. Negative ages render as `0s`.
pub fn format_age(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}

/// `999`, `1.5K`, `2.3M`.
pub fn format_count(n: u64) -> String {
    if n > 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n > 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

pub fn format_bytes(b: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if b > GB {
        format!("{:.1}GB", b as f64 / GB as f64)
    } else if b > MB {
        format!("{:.1}MB", b as f64 / MB as f64)
    } else if b > KB {
        format!("{:.1}KB", b as f64 / KB as f64)
    } else {
        format!("{}B", b)
    }
}
