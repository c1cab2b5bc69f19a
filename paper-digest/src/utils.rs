use chrono::Local;

/// Helpers for the console progress lines printed by the binary.
pub struct TextUtils;

impl TextUtils {
    /// Shortens `text` to at most `max_chars` characters, cutting at the last
    /// word boundary when there is one and appending `...`.
    pub fn smart_truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }

        let truncated: String = text.chars().take(max_chars).collect();
        match truncated.rfind(' ') {
            Some(last_space) if last_space > 0 => format!("{}...", &truncated[..last_space]),
            _ => format!("{}...", truncated),
        }
    }

    /// The `YYYY-MM-DD` part of a timestamp, or the text itself when shorter.
    pub fn date_part(timestamp: &str) -> &str {
        timestamp.get(..10).unwrap_or(timestamp)
    }

    /// `[HH:MM:SS]` in local time.
    pub fn clock() -> String {
        format!("[{}]", Local::now().format("%H:%M:%S"))
    }
}
