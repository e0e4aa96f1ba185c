// ABOUTME: Terminal rendering for snapshots and cache status
// ABOUTME: Turns arbitrary JSON payloads into tables without knowing resource layouts

use chrono::{DateTime, Utc};
use cloudlens_cache::EntryStatus;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::Value;

/// Columns shown for a list of objects; the rest is available with `--json`
pub const MAX_COLUMNS: usize = 6;
const MAX_CELL_WIDTH: usize = 40;

pub fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Table for a payload, or `None` when it is a bare scalar
pub fn payload_table(payload: &Value) -> Option<Table> {
    match payload {
        Value::Array(items) => Some(list_table(items)),
        Value::Object(fields) => {
            let mut table = new_table();
            table.set_header(vec!["Field", "Value"]);
            for (name, value) in fields {
                table.add_row(vec![name.clone(), cell_text(value)]);
            }
            Some(table)
        }
        _ => None,
    }
}

fn list_table(items: &[Value]) -> Table {
    let mut table = new_table();
    let columns = columns(items);

    if columns.is_empty() {
        table.set_header(vec!["Value"]);
        for item in items {
            table.add_row(vec![cell_text(item)]);
        }
        return table;
    }

    table.set_header(columns.clone());
    for item in items {
        table.add_row(
            columns
                .iter()
                .map(|column| item.get(column).map(cell_text).unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Keys in first-seen order across the objects in `items`, capped at [`MAX_COLUMNS`]
pub fn columns(items: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for fields in items.iter().filter_map(Value::as_object) {
        for name in fields.keys() {
            if columns.len() == MAX_COLUMNS {
                return columns;
            }
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

pub fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::Null => "—".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => items
            .iter()
            .map(cell_text)
            .collect::<Vec<_>>()
            .join(", "),
        _ => value.to_string(),
    };
    truncate(&text, MAX_CELL_WIDTH)
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// "just now", "5m ago", "3h ago", "2d ago"
pub fn format_age(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(fetched_at);
    if age.num_minutes() < 1 {
        "just now".to_string()
    } else if age.num_hours() < 1 {
        format!("{}m ago", age.num_minutes())
    } else if age.num_days() < 1 {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}d ago", age.num_days())
    }
}

/// One-line summary of an entry for listings
pub fn status_text(status: &EntryStatus, now: DateTime<Utc>) -> String {
    let mut parts = Vec::new();
    match status.last_updated {
        Some(at) if status.has_data => parts.push(format!("updated {}", format_age(at, now))),
        _ => parts.push("no data".to_string()),
    }
    if status.fetching {
        parts.push("refreshing".to_string());
    }
    if let Some(error) = &status.error {
        parts.push(format!("last refresh failed: {}", error));
    }
    parts.join(", ")
}

/// Count of rows a payload would render as
pub fn item_count(payload: &Value) -> usize {
    match payload {
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    }
}
