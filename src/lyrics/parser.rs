//! LRC format parser and position lookup
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Lines that do not match the pattern are skipped; out-of-order input is
//! tolerated and sorted.

/// A single lyric line with its offset from track start
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// Offset in milliseconds from start
    pub time_ms: u64,
    /// The lyric text
    pub text: String,
}

impl LyricLine {
    pub fn new(time_ms: u64, text: String) -> Self {
        Self { time_ms, text }
    }
}

/// An ordered lyric sheet. May be empty: that is the "no lyrics found"
/// sentinel, distinct from a sheet that was never fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricSheet {
    /// Lines sorted ascending by timestamp
    pub lines: Vec<LyricLine>,
    /// Whether the lines carry real timestamps
    pub synced: bool,
}

impl LyricSheet {
    /// Parse LRC formatted lyric text.
    pub fn parse(content: &str, synced: bool) -> Self {
        let mut lines = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // Skip metadata tags like [ti:Title]
            if Self::parse_metadata(line).is_some() {
                continue;
            }

            if synced {
                // Timestamped line like [00:12.34]Lyrics; anything else
                // in a synced sheet is noise and dropped.
                if let Some(parsed) = Self::parse_timed_line(line) {
                    lines.extend(parsed);
                }
            } else if !line.starts_with('[') {
                lines.push(LyricLine::new(0, line.to_string()));
            }
        }

        // Defensive: sources are normally pre-sorted, but not always.
        // The sort is stable, so equal timestamps keep input order.
        lines.sort_by_key(|l| l.time_ms);

        Self { lines, synced }
    }

    /// Index of the last line whose timestamp is at or before `elapsed_ms`,
    /// or `None` while playback is still ahead of the first line. Linear
    /// scan; sheets are tens to low hundreds of lines.
    pub fn line_index_at(&self, elapsed_ms: u64) -> Option<usize> {
        let mut current = None;
        for (i, line) in self.lines.iter().enumerate() {
            if line.time_ms <= elapsed_ms {
                current = Some(i);
            } else {
                break;
            }
        }
        current
    }

    /// Render the sheet back to LRC text, or bare lines for a plain
    /// sheet. This is what the lyrics cache stores.
    pub fn to_lrc(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            if self.synced {
                let min = line.time_ms / 60_000;
                let sec = (line.time_ms % 60_000) / 1000;
                let hundredths = (line.time_ms % 1000) / 10;
                out.push_str(&format!("[{min:02}:{sec:02}.{hundredths:02}]"));
            }
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }

    /// Parse metadata tag like [ti:Title]
    fn parse_metadata(line: &str) -> Option<(String, String)> {
        if !line.starts_with('[') || !line.contains(':') {
            return None;
        }

        let end = line.find(']')?;
        let tag_content = &line[1..end];

        let colon_pos = tag_content.find(':')?;
        let tag = &tag_content[..colon_pos];

        // Metadata tags are typically 2-3 chars, never digits
        if tag.len() <= 3 && tag.chars().all(|c| c.is_ascii_alphabetic()) {
            let value = tag_content[colon_pos + 1..].trim().to_string();
            return Some((tag.to_string(), value));
        }

        None
    }

    /// Parse a timed line like [00:12.34]Lyrics or [00:12.34][00:15.00]Lyrics
    fn parse_timed_line(line: &str) -> Option<Vec<LyricLine>> {
        let mut timestamps = Vec::new();
        let mut pos = 0;

        // Extract all timestamps at the beginning
        while pos < line.len() && line[pos..].starts_with('[') {
            if let Some(end) = line[pos..].find(']') {
                let timestamp_str = &line[pos + 1..pos + end];
                if let Some(ms) = Self::parse_timestamp(timestamp_str) {
                    timestamps.push(ms);
                    pos += end + 1;
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        if timestamps.is_empty() {
            return None;
        }

        // The rest is the lyric text
        let text = line[pos..].trim().to_string();

        let lines = timestamps
            .into_iter()
            .map(|ts| LyricLine::new(ts, text.clone()))
            .collect();

        Some(lines)
    }

    /// Parse timestamp string like "00:12.34" or "00:12:34" to milliseconds
    fn parse_timestamp(s: &str) -> Option<u64> {
        // Format: mm:ss.xx or mm:ss:xx or mm:ss
        let parts: Vec<&str> = s.split([':', '.']).collect();

        match parts.len() {
            2 => {
                let min: u64 = parts[0].parse().ok()?;
                let sec: u64 = parts[1].parse().ok()?;
                Some(min * 60 * 1000 + sec * 1000)
            }
            3 => {
                let min: u64 = parts[0].parse().ok()?;
                let sec: u64 = parts[1].parse().ok()?;
                let ms_str = parts[2];
                // Handle both "34" (centiseconds) and "340" (milliseconds)
                let ms: u64 = match ms_str.len() {
                    1 => ms_str.parse::<u64>().ok()? * 100,
                    2 => ms_str.parse::<u64>().ok()? * 10,
                    3 => ms_str.parse().ok()?,
                    _ => return None,
                };
                Some(min * 60 * 1000 + sec * 1000 + ms)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_forms() {
        assert_eq!(LyricSheet::parse_timestamp("00:12"), Some(12000));
        assert_eq!(LyricSheet::parse_timestamp("01:30"), Some(90000));
        assert_eq!(LyricSheet::parse_timestamp("00:12.34"), Some(12340));
        assert_eq!(LyricSheet::parse_timestamp("00:12.340"), Some(12340));
        assert_eq!(LyricSheet::parse_timestamp("00:12:34"), Some(12340));
        assert_eq!(LyricSheet::parse_timestamp("not a time"), None);
    }

    #[test]
    fn parses_and_skips_noise() {
        let lrc = "\
[ti:Test Song]
[ar:Test Artist]
[00:12.34]First line
no timestamp here
[00:15.00]Second line
";
        let sheet = LyricSheet::parse(lrc, true);
        assert_eq!(sheet.lines.len(), 2);
        assert_eq!(sheet.lines[0].time_ms, 12340);
        assert_eq!(sheet.lines[0].text, "First line");
    }

    #[test]
    fn sorts_out_of_order_input() {
        let lrc = "\
[00:30.00]Third
[00:10.00]First
[00:20.00]Second
";
        let sheet = LyricSheet::parse(lrc, true);
        let times: Vec<u64> = sheet.lines.iter().map(|l| l.time_ms).collect();
        assert_eq!(times, vec![10000, 20000, 30000]);
        assert_eq!(sheet.lines[0].text, "First");
    }

    #[test]
    fn repeated_timestamps_expand_to_lines() {
        let sheet = LyricSheet::parse("[00:05.00][00:25.00]Chorus", true);
        assert_eq!(sheet.lines.len(), 2);
        assert_eq!(sheet.lines[0].time_ms, 5000);
        assert_eq!(sheet.lines[1].time_ms, 25000);
        assert_eq!(sheet.lines[1].text, "Chorus");
    }

    #[test]
    fn plain_sheets_keep_text_lines() {
        let sheet = LyricSheet::parse("First line\nSecond line\n", false);
        assert_eq!(sheet.lines.len(), 2);
        assert!(!sheet.synced);
        assert_eq!(sheet.lines[1].text, "Second line");
    }

    #[test]
    fn lookup_before_first_line() {
        let sheet = LyricSheet::parse("[00:10.00]First\n[00:20.00]Second", true);
        assert_eq!(sheet.line_index_at(0), None);
        assert_eq!(sheet.line_index_at(9999), None);
        assert_eq!(sheet.line_index_at(10000), Some(0));
    }

    #[test]
    fn lookup_is_monotonic() {
        let sheet = LyricSheet::parse(
            "[00:10.00]a\n[00:20.00]b\n[00:20.00]b2\n[00:30.00]c",
            true,
        );
        let mut last = None;
        for t in (0..40000).step_by(500) {
            let idx = sheet.line_index_at(t);
            assert!(idx >= last, "index went backwards at t={t}");
            last = idx;
        }
        // ties resolve to the last of the equal-timestamp lines
        assert_eq!(sheet.line_index_at(20000), Some(2));
        assert_eq!(sheet.line_index_at(35000), Some(3));
    }

    #[test]
    fn empty_sheet_lookup() {
        let sheet = LyricSheet::parse("", true);
        assert!(sheet.lines.is_empty());
        assert_eq!(sheet.line_index_at(123456), None);
    }

    #[test]
    fn cache_rendering_survives_reparse() {
        let sheet = LyricSheet::parse("[00:12.34]First line\n[01:05.00]Second line", true);
        assert_eq!(LyricSheet::parse(&sheet.to_lrc(), true), sheet);

        let plain = LyricSheet::parse("First line\nSecond line", false);
        assert_eq!(LyricSheet::parse(&plain.to_lrc(), false), plain);
    }
}
