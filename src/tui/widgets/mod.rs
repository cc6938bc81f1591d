//! Screen widgets. Every render function takes the theme explicitly;
//! there is no global style state.

pub mod album;
pub mod downloads;
pub mod help;
pub mod now_playing;
pub mod root;
pub mod search;

use crate::tui::theme::Icons;

/// Truncate to `max_len` characters with a trailing ellipsis.
pub(crate) fn truncate_str(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    let char_count: usize = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        s.chars().take(max_len).collect()
    }
}

pub(crate) fn fmt_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub(crate) fn progress_bar(width: usize, ratio: f64, icons: &Icons) -> String {
    if width < 3 {
        return String::new();
    }
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = ((width - 1) as f64 * ratio).round() as usize;
    let empty = width.saturating_sub(filled + 1);

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..filled {
        bar.push_str(icons.progress_full);
    }
    bar.push_str(icons.progress_head);
    for _ in 0..empty {
        bar.push_str(icons.progress_empty);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_str("héllo wörld", 8), "héllo...");
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("abc", 0), "");
    }

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(fmt_clock(0), "00:00");
        assert_eq!(fmt_clock(125), "02:05");
    }
}
