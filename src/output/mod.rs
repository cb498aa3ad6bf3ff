//! Output formatting for CLI display
//!
//! This module turns session state into terminal text: one block per visible
//! level, the selected value, and pending notifications. With `quiet` set the
//! decoration is dropped so the output can be piped.

use crate::browse::{BrowseSession, Notification, NotificationKind};
use crate::key::Key;
use crate::models::{Entry, Value};
use crate::path::{self, KeyPath};
use crate::window::{Direction, PaginationWindow};
use colored::Colorize;
use std::fmt::Write as _;

/// Header line naming a level
#[must_use]
pub fn level_header(index: usize, path: &KeyPath, quiet: bool) -> String {
    let name = if path.is_root() {
        "/".to_string()
    } else {
        path.to_string()
    };
    if quiet {
        name
    } else {
        format!("[{index}] {}", name.bold())
    }
}

/// One entry of a level; `selected` marks the entry on the selected path
#[must_use]
pub fn entry_line(entry: &Entry, selected: bool, quiet: bool) -> String {
    let key = entry.key.to_string();
    if quiet {
        return if entry.bucket {
            format!("{key}{}", path::BUCKET_SEPARATOR.trim_end())
        } else {
            key
        };
    }

    let marker = if selected { ">".green().bold() } else { " ".normal() };
    match entry.value() {
        None => format!("{marker} {}{}", key.blue(), path::BUCKET_SEPARATOR.trim_end().blue()),
        Some(value) => format!("{marker} {key} {}", format!("({})", value.format()).dimmed()),
    }
}

/// Marker for one end of a window, unless that end is known to be final
#[must_use]
pub fn edge_marker(window: &PaginationWindow, direction: Direction) -> Option<String> {
    if window.is_exhausted(direction) || window.is_empty() {
        None
    } else if window.is_loading(direction) {
        Some(format!("  {}", "loading...".dimmed()))
    } else {
        Some(format!("  {}", "...".dimmed()))
    }
}

/// A value in its pretty form, or hex when it has none or `hex` is set
#[must_use]
pub fn value_text(value: &Value, hex: bool) -> String {
    match (&value.pretty, hex) {
        (Some(pretty), false) => pretty.text.clone(),
        _ => value.hex(),
    }
}

/// The value pane: key, detected format and content
#[must_use]
pub fn value_block(key: &Key, value: Option<&Value>, quiet: bool) -> String {
    let Some(value) = value else {
        return if quiet {
            String::new()
        } else {
            format!("{} {}", key.to_string().bold(), "(not loaded)".dimmed())
        };
    };
    if quiet {
        return value_text(value, false);
    }
    format!(
        "{} {}\n{}",
        key.to_string().bold(),
        format!("[{}]", value.format()).cyan(),
        value_text(value, false)
    )
}

/// A notification line, colored by kind
#[must_use]
pub fn notification_line(notification: &Notification) -> String {
    let mut line = match notification.kind {
        NotificationKind::Error => notification.message.red().to_string(),
        NotificationKind::Success => notification.message.green().to_string(),
    };
    if let Some(extra) = &notification.extra {
        let _ = write!(line, " {}", extra.dimmed());
    }
    line
}

/// Format an error message for stderr
#[must_use]
pub fn error(message: &str) -> String {
    format!("{} {message}", "error:".red().bold())
}

/// Render the visible part of a session
#[must_use]
pub fn render_session(session: &BrowseSession, window_size: usize, quiet: bool) -> String {
    let visible = session.visible_levels(window_size);
    let mut out = String::new();

    for (offset, window) in visible.levels.iter().enumerate() {
        let index = visible.first + offset;
        let on_path = session.selected_in_level(index).map(|e| &e.key);

        let _ = writeln!(out, "{}", level_header(index, window.path(), quiet));
        if let Some(marker) = edge_marker(window, Direction::Before).filter(|_| !quiet) {
            let _ = writeln!(out, "{marker}");
        }
        if window.is_empty() && !quiet {
            let _ = writeln!(out, "  {}", "(empty)".dimmed());
        }
        for entry in window.entries() {
            let selected = on_path == Some(&entry.key);
            let _ = writeln!(out, "{}", entry_line(entry, selected, quiet));
        }
        if let Some(marker) = edge_marker(window, Direction::After).filter(|_| !quiet) {
            let _ = writeln!(out, "{marker}");
        }
        out.push('\n');
    }

    if let Some(key) = visible.value {
        let depth = session.levels().len().saturating_sub(1);
        let value = session
            .level(depth)
            .and_then(|w| w.find(key))
            .and_then(Entry::value);
        let _ = writeln!(out, "{}", value_block(key, value, quiet));
    }

    if !quiet {
        for notification in session.notifications().iter() {
            let _ = writeln!(out, "{}", notification_line(notification));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_entries() {
        let bucket = Entry::bucket(Key::from_text("users"));
        assert_eq!(entry_line(&bucket, false, true), r#""users" /"#);

        let leaf = Entry::leaf(Key::from_hex("00ff").unwrap(), Value::from_bytes(vec![1]));
        assert_eq!(entry_line(&leaf, true, true), "0x00ff");
    }

    #[test]
    fn test_quiet_header() {
        assert_eq!(level_header(0, &KeyPath::root(), true), "/");
        let path = KeyPath::from(vec![Key::from_text("a")]);
        assert_eq!(level_header(1, &path, true), r#""a""#);
    }

    #[test]
    fn test_value_text_prefers_pretty() {
        let json = Value::from_bytes(br#"{"a":1}"#.to_vec());
        assert_eq!(value_text(&json, false), "{\n  \"a\": 1\n}");
        assert_eq!(value_text(&json, true), hex::encode(br#"{"a":1}"#));

        let binary = Value::from_bytes(vec![0, 159, 146, 150]);
        assert_eq!(value_text(&binary, false), "009f9296");
    }

    #[test]
    fn test_colored_entry_marks_selection() {
        colored::control::set_override(false);
        let bucket = Entry::bucket(Key::from_text("a"));
        assert_eq!(entry_line(&bucket, true, false), r#"> "a" /"#);
        let leaf = Entry::leaf(Key::from_text("k"), Value::from_bytes(b"text".to_vec()));
        assert_eq!(entry_line(&leaf, false, false), r#"  "k" (string)"#);
    }
}
