//! Display helpers for CLI output: grouped sections, uptime and
//! relative-time formatting, status footer.

use chrono::{DateTime, Utc};

use portdock_core::{CategoryGroup, ServerRecord};
use portdock_sync::SyncState;

/// Uptime as a compact duration: `42s`, `5m`, `2h 05m`.
pub fn format_uptime(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else {
        format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

/// Relative-time helper: seconds since an event -> human string.
pub fn relative_time(seconds: i64) -> String {
    let s = seconds.unsigned_abs();
    if s < 5 {
        "just now".to_string()
    } else if s < 60 {
        format!("{s}s ago")
    } else if s < 3600 {
        format!("{}m ago", s / 60)
    } else {
        format!("{}h ago", s / 3600)
    }
}

fn format_record(record: &ServerRecord) -> String {
    let desc = if record.is_recognized() {
        record.description.as_str()
    } else {
        "unrecognized process"
    };
    let meta = if record.framework.is_empty() {
        format_uptime(record.uptime_seconds)
    } else {
        format!("{} · {}", record.framework, format_uptime(record.uptime_seconds))
    };
    format!(
        "  :{:<5}  {:<24}  {:<28}  {}",
        record.port, record.project_name, desc, meta
    )
}

/// Render projected groups as sections. Collapsed sections keep their
/// header (with count) so folded categories stay discoverable.
pub fn format_groups(groups: &[CategoryGroup]) -> String {
    let mut out = String::new();

    for group in groups {
        if group.collapsed {
            out.push_str(&format!(
                "{} ({}) [collapsed]\n",
                group.label,
                group.records.len()
            ));
            continue;
        }
        out.push_str(&format!("{} ({})\n", group.label, group.records.len()));
        for record in &group.records {
            out.push_str(&format_record(record));
            out.push('\n');
        }
    }

    // Trim trailing newlines
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Footer line: server count, last-update age, and the error banner when
/// retries are exhausted (the stale list above it stays visible).
pub fn format_status(state: &SyncState, now: DateTime<Utc>) -> String {
    let count = state.snapshot.len();
    let noun = if count == 1 { "server" } else { "servers" };
    let age = state
        .last_update
        .map(|t| relative_time((now - t).num_seconds()))
        .unwrap_or_else(|| "never".to_string());

    match &state.last_error {
        Some(err) => format!("{count} {noun} · updated {age} · backend error: {err}"),
        None => format!("{count} {noun} · updated {age}"),
    }
}
