//! Turns a lookup response into chat text.

use std::fmt::Write;

use crate::models::{Entry, SearchResponse};

/// Attribution line closing every result list.
pub const FOOTER: &str = "🔴 *Credit by Smart Sunny*";

const RULE_WIDTH: usize = 30;

/// Format a successful response for the user who searched for `query`.
///
/// Entries are shown in the order the API returned them.
pub fn format_response(response: &SearchResponse, query: &str) -> String {
    let entries = response.entries();
    if entries.is_empty() {
        return format!("🔍 No results found for: {}", query);
    }

    let mut text = format!("🔍 Search Results for: {}\n\n", query);
    for entry in entries {
        write_entry(&mut text, entry);
    }

    let _ = write!(
        text,
        "📊 Summary: Found {} results across different data types.\n\n",
        entries.len()
    );
    text.push_str(FOOTER);
    text
}

fn write_entry(text: &mut String, entry: &Entry) {
    let kind = entry.entry_type();
    let value = entry.display_value();

    let _ = writeln!(text, "📋 Type: {}", kind.display_name());
    let _ = writeln!(text, "🔎 Value: {}", value);

    if let Some((icon, label)) = kind.headline() {
        let _ = writeln!(text, "{} {}: {}", icon, label, value);
    }
    for field in kind.detail_fields() {
        let _ = writeln!(text, "{} {}: {}", field.icon, field.label, entry.detail(field.key));
    }

    text.push_str(&"─".repeat(RULE_WIDTH));
    text.push_str("\n\n");
}
