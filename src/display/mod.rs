//! Tool-summary formatting: turns a tool invocation (name + arguments) into
//! the short one-line summary shown in status messages.

use serde_json::Value;
use url::Url;

/// Detail values longer than this are cut with an ellipsis, keeping the full
/// summary well under typical chat message limits.
const MAX_DETAIL_LEN: usize = 160;

const FALLBACK_ICON: &str = "🧩";

/// Resolved presentation for one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDisplay {
    pub icon: &'static str,
    pub label: String,
    pub detail: Option<String>,
}

/// Resolve the icon, label and detail line for a tool invocation.
///
/// Known tools match case-sensitively first, then case-insensitively.
/// Unknown tools get the generic icon and a title-cased label.
pub fn resolve_tool_display(name: &str, args: Option<&Value>) -> ToolDisplay {
    let (icon, label, detail_key) = match known_tool(name) {
        Some(entry) => entry,
        None => {
            return ToolDisplay {
                icon: FALLBACK_ICON,
                label: title_case(name),
                detail: None,
            };
        }
    };

    let detail = match detail_key {
        DetailKey::Arg(key) => arg_string(args, key),
        DetailKey::BrowserAction => browser_detail(args),
    };

    ToolDisplay {
        icon,
        label: label.to_string(),
        detail,
    }
}

/// Format a resolved display as `icon label` or `icon label: detail`.
pub fn format_tool_summary(display: &ToolDisplay) -> String {
    match &display.detail {
        Some(detail) => format!(
            "{} {}: {}",
            display.icon,
            display.label,
            truncate(detail, MAX_DETAIL_LEN)
        ),
        None => format!("{} {}", display.icon, display.label),
    }
}

enum DetailKey {
    /// Pull the detail from a single argument key.
    Arg(&'static str),
    /// Browser tools show the action plus an optional target URL.
    BrowserAction,
}

fn known_tool(name: &str) -> Option<(&'static str, &'static str, DetailKey)> {
    let exact = lookup(name);
    if exact.is_some() {
        return exact;
    }
    lookup(&name.to_lowercase())
}

fn lookup(name: &str) -> Option<(&'static str, &'static str, DetailKey)> {
    let entry = match name {
        "exec" => ("🛠️", "Exec", DetailKey::Arg("command")),
        "Read" | "read" => ("📖", "Read", DetailKey::Arg("path")),
        "write" => ("✍️", "Write", DetailKey::Arg("path")),
        "edit" => ("📝", "Edit", DetailKey::Arg("path")),
        "browser" => ("🌐", "Browser", DetailKey::BrowserAction),
        "memory_search" => ("🧠", "Memory Search", DetailKey::Arg("query")),
        "web_search" => ("🔍", "Web Search", DetailKey::Arg("query")),
        "web_fetch" => ("🌐", "Web Fetch", DetailKey::Arg("url")),
        "list_files" => ("📂", "List Files", DetailKey::Arg("path")),
        _ => return None,
    };
    Some(entry)
}

fn arg_string(args: Option<&Value>, key: &str) -> Option<String> {
    let value = args?.get(key)?;
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn browser_detail(args: Option<&Value>) -> Option<String> {
    let action = arg_string(args, "action")?;
    let target = arg_string(args, "targetUrl").or_else(|| arg_string(args, "url"));
    match target {
        Some(raw) => Some(format!("{} {}", action, display_url(&raw))),
        None => Some(action),
    }
}

/// Normalize a URL for display, falling back to the raw string when it does
/// not parse. Malformed values must never make the formatter fail.
fn display_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn title_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max).collect();
    cut.push('…');
    cut
}
