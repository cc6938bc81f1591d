//! Comparison-key normalization for titles and artists.
//!
//! Catalog metadata is noisy: uploader suffixes, bracketed annotations,
//! promotional tags. Matching runs on normalized keys, never on display
//! strings.

/// Promotional noise removed from titles wherever it appears.
/// Longer phrases first so "official video" goes before "official".
const PROMO_TOKENS: &[&str] = &[
    "official music video",
    "official video",
    "official audio",
    "music video",
    "lyric video",
    "lyrics",
    "official",
    "video",
    "audio",
    "full song",
    "hd",
    "4k",
    "720p",
    "1080p",
];

const FEAT_MARKERS: &[&str] = &["ft.", "feat."];

/// Uploader decorations trimmed from the end of artist names.
const CHANNEL_SUFFIXES: &[&str] = &[" - topic", "vevo"];

/// Builds a comparison key from a free-text title or album name.
///
/// Removes bracketed and parenthesized substrings, strips promotional
/// tokens, drops a trailing "by Artist" clause and featuring markers,
/// case-folds and collapses whitespace. Total; empty input yields an
/// empty key. Stripping runs to a fixed point so the result is stable
/// under re-normalization.
pub fn normalize_title(raw: &str) -> String {
    let mut cur = raw.to_lowercase();
    loop {
        let next = strip_noise(&cur);
        if next == cur {
            return cur;
        }
        cur = next;
    }
}

/// Builds a comparison key from an artist display string.
pub fn normalize_artist(raw: &str) -> String {
    let mut s = raw.trim().to_lowercase();
    for suffix in CHANNEL_SUFFIXES {
        if let Some(rest) = s.strip_suffix(suffix) {
            s = rest.trim_end().to_string();
        }
    }
    s.trim().to_string()
}

fn strip_noise(input: &str) -> String {
    let mut s = strip_enclosed(input, '[', ']');
    s = strip_enclosed(&s, '(', ')');

    for token in PROMO_TOKENS {
        if s.contains(token) {
            s = s.replace(token, "");
        }
    }

    // "Song by Artist" tails: cut at the first standalone "by".
    if let Some(idx) = s.find(" by ") {
        s.truncate(idx);
    }

    for marker in FEAT_MARKERS {
        if s.contains(marker) {
            s = s.replace(marker, "");
        }
    }

    collapse_whitespace(&s)
}

/// Removes every `open`..`close` span, including the delimiters.
/// Unbalanced delimiters are left in place; the caller's fixed-point
/// loop picks up spans uncovered by an earlier removal.
fn strip_enclosed(input: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(open) {
        match rest[start..].find(close) {
            Some(rel_end) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + rel_end + close.len_utf8()..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for word in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_brackets_and_parens() {
        assert_eq!(normalize_title("Song [Live] (Remastered 2011)"), "song");
        assert_eq!(normalize_title("Intro (feat. Someone)"), "intro");
    }

    #[test]
    fn strips_promo_tokens_case_insensitive() {
        assert_eq!(normalize_title("Song Official Music Video"), "song");
        assert_eq!(normalize_title("Song OFFICIAL AUDIO"), "song");
        assert_eq!(normalize_title("Song lyric video HD"), "song");
    }

    #[test]
    fn strips_by_artist_tail() {
        assert_eq!(normalize_title("Great Song by Example Band"), "great song");
    }

    #[test]
    fn strips_feat_markers() {
        assert_eq!(normalize_title("Song ft. Guest"), "song guest");
        assert_eq!(normalize_title("Song feat. Guest"), "song guest");
    }

    #[test]
    fn empty_input_yields_empty_key() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("   "), "");
        assert_eq!(normalize_artist(""), "");
    }

    #[test]
    fn unbalanced_delimiters_kept() {
        assert_eq!(normalize_title("Song [unclosed"), "song [unclosed");
        assert_eq!(normalize_title("Song )stray("), "song )stray(");
    }

    #[test]
    fn nested_parens_match_shortest_span() {
        // Removal is non-nesting: the span ends at the first close, so a
        // stray close can survive. Keys are for containment checks only.
        assert_eq!(normalize_title("Song ((a) b)"), "song b)");
        assert_eq!(normalize_title("Song ((nested))"), "song )");
    }

    #[test]
    fn idempotent_on_assorted_inputs() {
        let inputs = [
            "Song [Live] (Remastered)",
            "Great Song by Example Band",
            "Track ft. Guest OFFICIAL VIDEO",
            "offofficialicial",
            "plain title",
            "  spaced   out  ",
            "",
            "Дорожка (Official)",
        ];
        for raw in inputs {
            let once = normalize_title(raw);
            assert_eq!(normalize_title(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn artist_drops_channel_decorations() {
        assert_eq!(normalize_artist("Example Band - Topic"), "example band");
        assert_eq!(normalize_artist("ExampleVEVO"), "example");
        assert_eq!(normalize_artist("Example Band"), "example band");
    }
}
