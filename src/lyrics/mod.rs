//! Synchronized lyrics: fetch strategies, LRC parsing, position lookup
//!
//! This module provides:
//! - LRCLIB API client for fetching lyrics
//! - A short-circuiting fetch strategy chain
//! - LRC parsing and elapsed-time lookup for the playback tick

pub mod lrclib;
pub mod parser;

pub use lrclib::LrclibClient;
pub use parser::{LyricLine, LyricSheet};

use crate::catalog::normalize::{normalize_artist, normalize_title};
use tracing::debug;

/// Fetch lyrics for a track, trying strategies in order until one hits:
///
/// 1. Broad search for "artist title" on the normalized names; first
///    candidate with time-tagged text wins.
/// 2. If the raw title looks like "Artist - Title", split it and search
///    again with the embedded names.
/// 3. Exact get by artist and title, deliberately without the duration
///    hint; a plain-text-only candidate is accepted here.
///
/// Transport failures are absorbed per strategy. `None` covers both
/// "nothing found" and "every strategy failed"; callers treat it as the
/// lyrics being unavailable.
pub async fn fetch_lyrics(
    client: &LrclibClient,
    title: &str,
    artist: &str,
    // Accepted for logging only; step 3 queries without the hint so a
    // candidate with a mismatched runtime is still accepted.
    duration_seconds: Option<u32>,
) -> Option<LyricSheet> {
    let clean_title = normalize_title(title);
    let clean_artist = normalize_artist(artist);
    debug!(
        title = %clean_title,
        artist = %clean_artist,
        duration = ?duration_seconds,
        "fetching lyrics"
    );

    let query = format!("{clean_artist} {clean_title}");
    if let Some(sheet) = try_search(client, &query).await {
        return Some(sheet);
    }

    if let Some((embedded_artist, embedded_title)) = split_embedded_artist(title) {
        let query = format!(
            "{} {}",
            normalize_artist(&embedded_artist),
            normalize_title(&embedded_title)
        );
        if let Some(sheet) = try_search(client, &query).await {
            return Some(sheet);
        }
    }

    match client.get_exact(&clean_title, &clean_artist, None).await {
        Ok(Some(entry)) => {
            if entry.has_synced() {
                return Some(LyricSheet::parse(entry.synced_lyrics.as_deref()?, true));
            }
            if entry.has_plain() {
                return Some(LyricSheet::parse(entry.plain_lyrics.as_deref()?, false));
            }
            None
        }
        Ok(None) => None,
        Err(err) => {
            debug!(error = %err, "exact lyric lookup failed");
            None
        }
    }
}

async fn try_search(client: &LrclibClient, query: &str) -> Option<LyricSheet> {
    match client.search(query).await {
        Ok(entries) => entries
            .iter()
            .find(|e| e.has_synced())
            .and_then(|e| e.synced_lyrics.as_deref())
            .map(|text| LyricSheet::parse(text, true)),
        Err(err) => {
            debug!(query, error = %err, "lyric search failed");
            None
        }
    }
}

/// Titles sometimes encode "Artist - Title"; split at the first separator.
fn split_embedded_artist(title: &str) -> Option<(String, String)> {
    let (artist, rest) = title.split_once(" - ")?;
    if artist.trim().is_empty() || rest.trim().is_empty() {
        return None;
    }
    Some((artist.to_string(), rest.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_embedded_artist_once() {
        assert_eq!(
            split_embedded_artist("Cool Band - Their Song - Live"),
            Some(("Cool Band".to_string(), "Their Song - Live".to_string()))
        );
    }

    #[test]
    fn plain_titles_do_not_split() {
        assert_eq!(split_embedded_artist("Just a Song"), None);
        assert_eq!(split_embedded_artist(" - dangling"), None);
        assert_eq!(split_embedded_artist("dangling - "), None);
    }
}
