//! Album track-listing reconstruction.
//!
//! The catalog exposes no direct album browse to anonymous clients, so an
//! album is rebuilt from track search: a fixed sequence of query phrasings,
//! lenient key matching against the noisy album/artist metadata, and a
//! related-tracks fallback when no phrasing matches anything.

use crate::catalog::api::CatalogClient;
use crate::catalog::models::Track;
use crate::catalog::normalize::{normalize_artist, normalize_title};
use std::future::Future;
use tracing::debug;

/// Cap on artist-only matches accepted by the fallback pass. An album
/// match is strong evidence on its own; an artist-only match is weak, so
/// those stop once the listing reaches this size. Tunable via
/// `[resolver] fallback_cap`.
pub const DEFAULT_FALLBACK_CAP: usize = 10;

/// The search surface the resolver runs against. The app hands in the
/// real client; tests hand in a stub.
pub trait CatalogSearch {
    fn search_tracks(
        &self,
        query: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<Track>>> + Send;
    fn related_tracks(
        &self,
        video_id: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<Track>>> + Send;
}

impl CatalogSearch for CatalogClient {
    async fn search_tracks(&self, query: &str) -> anyhow::Result<Vec<Track>> {
        CatalogClient::search_tracks(self, query).await
    }

    async fn related_tracks(&self, video_id: &str) -> anyhow::Result<Vec<Track>> {
        CatalogClient::related_tracks(self, video_id).await
    }
}

/// An album resolution request. Normalized keys are computed once and
/// reused across every strategy attempt.
#[derive(Debug, Clone)]
pub struct AlbumQuery {
    pub album_title: String,
    pub artist: String,
    album_key: String,
    artist_key: String,
}

impl AlbumQuery {
    pub fn new(album_title: &str, artist: &str) -> Self {
        Self {
            album_title: album_title.to_string(),
            artist: artist.to_string(),
            album_key: normalize_title(album_title),
            artist_key: normalize_artist(artist),
        }
    }

    /// Query phrasings, tried in order.
    fn variants(&self) -> [String; 4] {
        [
            format!("{} {}", self.album_title, self.artist),
            format!("{} album {}", self.artist, self.album_title),
            format!("\"{}\" \"{}\"", self.album_title, self.artist),
            self.album_title.clone(),
        ]
    }

    fn album_matches(&self, track: &Track) -> bool {
        let Some(album) = track.album.as_deref() else {
            return false;
        };
        keys_overlap(&normalize_title(album), &self.album_key)
    }

    fn artist_matches(&self, track: &Track) -> bool {
        keys_overlap(&normalize_artist(&track.artist_line()), &self.artist_key)
    }
}

/// Lenient containment in either direction. Catalog metadata rarely
/// agrees on exact album names ("Greatest Hits" vs "Greatest Hits
/// (Remastered)"), so one key containing the other counts as a match.
/// Empty keys never match; they would contain trivially.
fn keys_overlap(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(b) || b.contains(a)
}

/// Outcome of one resolution attempt. `Found` is final for the attempt;
/// `NotFound` carries the query for diagnostic display.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Vec<Track>),
    NotFound { album_title: String, artist: String },
}

/// Reconstructs an album's track listing.
///
/// Runs the query variants in order against track search, short-circuiting
/// on the first variant that yields an accepted candidate. A candidate is
/// accepted when its album and artist keys both overlap the query's, its
/// identifier is playable, and it is not already in the listing. Transport
/// failures for one variant are logged and skipped, never fatal.
///
/// If no variant matches, the first playable candidate seen anywhere is
/// used as a seed for a related-tracks expansion with a looser rule:
/// album overlap alone is enough, and artist-only overlap is accepted
/// while the listing is below `fallback_cap`.
pub async fn resolve_album_tracks<C: CatalogSearch>(
    backend: &C,
    query: &AlbumQuery,
    fallback_cap: usize,
) -> Resolution {
    let mut accepted: Vec<Track> = Vec::new();
    let mut seed: Option<Track> = None;

    for variant in query.variants() {
        let candidates = match backend.search_tracks(&variant).await {
            Ok(candidates) => candidates,
            Err(err) => {
                debug!(%variant, error = %err, "search variant failed");
                continue;
            }
        };
        if seed.is_none() {
            seed = candidates.iter().find(|t| t.has_playable_id()).cloned();
        }
        for track in candidates {
            if !query.album_matches(&track) || !query.artist_matches(&track) {
                continue;
            }
            if !track.has_playable_id() {
                continue;
            }
            if accepted.iter().any(|t| t.video_id == track.video_id) {
                continue;
            }
            accepted.push(track);
        }
        if !accepted.is_empty() {
            debug!(%variant, count = accepted.len(), "variant matched");
            return Resolution::Found(accepted);
        }
    }

    if let Some(seed) = seed {
        debug!(seed = %seed.video_id, "no variant matched, expanding related tracks");
        match backend.related_tracks(&seed.video_id).await {
            Ok(related) => {
                for track in related {
                    let album_ok = query.album_matches(&track);
                    let artist_ok = query.artist_matches(&track);
                    if !(album_ok || (artist_ok && accepted.len() < fallback_cap)) {
                        continue;
                    }
                    if !track.has_playable_id() {
                        continue;
                    }
                    if accepted.iter().any(|t| t.video_id == track.video_id) {
                        continue;
                    }
                    accepted.push(track);
                }
            }
            Err(err) => {
                debug!(error = %err, "related-tracks expansion failed");
            }
        }
        if !accepted.is_empty() {
            return Resolution::Found(accepted);
        }
    }

    Resolution::NotFound {
        album_title: query.album_title.clone(),
        artist: query.artist.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn track(id: &str, title: &str, artist: &str, album: Option<&str>) -> Track {
        Track {
            video_id: id.to_string(),
            title: title.to_string(),
            artists: vec![artist.to_string()],
            album: album.map(|a| a.to_string()),
            thumbnail: None,
            duration_seconds: Some(200),
        }
    }

    #[derive(Default)]
    struct StubCatalog {
        // one response per search call, in order; exhausted means empty
        search_responses: Mutex<Vec<Vec<Track>>>,
        search_queries: Mutex<Vec<String>>,
        related_response: Vec<Track>,
        related_calls: AtomicUsize,
    }

    impl CatalogSearch for StubCatalog {
        async fn search_tracks(&self, query: &str) -> anyhow::Result<Vec<Track>> {
            self.search_queries.lock().unwrap().push(query.to_string());
            let mut responses = self.search_responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(responses.remove(0))
            }
        }

        async fn related_tracks(&self, _video_id: &str) -> anyhow::Result<Vec<Track>> {
            self.related_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.related_response.clone())
        }
    }

    #[tokio::test]
    async fn empty_catalog_yields_not_found_with_one_call_per_variant() {
        let stub = StubCatalog::default();
        let query = AlbumQuery::new("Greatest Hits", "Example Band");

        let outcome = resolve_album_tracks(&stub, &query, DEFAULT_FALLBACK_CAP).await;

        assert_eq!(
            outcome,
            Resolution::NotFound {
                album_title: "Greatest Hits".to_string(),
                artist: "Example Band".to_string(),
            }
        );
        let queries = stub.search_queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![
                "Greatest Hits Example Band",
                "Example Band album Greatest Hits",
                "\"Greatest Hits\" \"Example Band\"",
                "Greatest Hits",
            ]
        );
        // nothing playable was ever seen, so no fallback expansion either
        assert_eq!(stub.related_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn third_variant_short_circuits_and_dedupes() {
        let hit = track("aaaaaaaaaa1", "One", "Example Band", Some("Greatest Hits"));
        let stub = StubCatalog {
            search_responses: Mutex::new(vec![
                Vec::new(),
                Vec::new(),
                vec![
                    hit.clone(),
                    hit.clone(),
                    track("aaaaaaaaaa2", "Two", "Example Band", Some("Greatest Hits")),
                ],
            ]),
            ..Default::default()
        };
        let query = AlbumQuery::new("Greatest Hits", "Example Band");

        let outcome = resolve_album_tracks(&stub, &query, DEFAULT_FALLBACK_CAP).await;

        let Resolution::Found(tracks) = outcome else {
            panic!("expected tracks");
        };
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].video_id, "aaaaaaaaaa1");
        assert_eq!(tracks[1].video_id, "aaaaaaaaaa2");
        // fourth variant never queried
        assert_eq!(stub.search_queries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn short_identifiers_never_surface() {
        // matches on both keys, but the id is one char too short
        let invalid = track("short", "One", "Example Band", Some("Greatest Hits"));
        let stub = StubCatalog {
            search_responses: Mutex::new(vec![vec![invalid]]),
            ..Default::default()
        };
        let query = AlbumQuery::new("Greatest Hits", "Example Band");

        let outcome = resolve_album_tracks(&stub, &query, DEFAULT_FALLBACK_CAP).await;

        assert!(matches!(outcome, Resolution::NotFound { .. }));
        // an unplayable candidate is no seed either
        assert_eq!(stub.related_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn album_match_is_containment_not_equality() {
        let stub = StubCatalog {
            search_responses: Mutex::new(vec![vec![
                track(
                    "aaaaaaaaaa1",
                    "One",
                    "Example Band",
                    Some("Greatest Hits (Remastered)"),
                ),
                track("aaaaaaaaaa2", "Two", "Example Band", Some("Unrelated Album")),
            ]]),
            ..Default::default()
        };
        let query = AlbumQuery::new("Greatest Hits", "Example Band");

        let outcome = resolve_album_tracks(&stub, &query, DEFAULT_FALLBACK_CAP).await;

        let Resolution::Found(tracks) = outcome else {
            panic!("expected tracks");
        };
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].video_id, "aaaaaaaaaa1");
    }

    #[tokio::test]
    async fn fallback_expands_seed_with_capped_artist_matches() {
        let mut related = vec![track(
            "rrrrrrrrrr0",
            "On Album",
            "Someone Else",
            Some("Greatest Hits"),
        )];
        for i in 0..12 {
            related.push(track(
                &format!("rrrrrrrrr{i:02}"),
                "Artist Only",
                "Example Band",
                Some("Other Record"),
            ));
        }
        related.push(track("zzzzzzzzzz9", "Unrelated", "Nobody", Some("Nothing")));

        let stub = StubCatalog {
            // every variant returns the same non-matching but playable track
            search_responses: Mutex::new(vec![vec![track(
                "ssssssssss1",
                "Seed",
                "Example Band",
                Some("Live Bootleg"),
            )]]),
            related_response: related,
            ..Default::default()
        };
        let query = AlbumQuery::new("Greatest Hits", "Example Band");

        let outcome = resolve_album_tracks(&stub, &query, DEFAULT_FALLBACK_CAP).await;

        assert_eq!(stub.related_calls.load(Ordering::SeqCst), 1);
        let Resolution::Found(tracks) = outcome else {
            panic!("expected tracks");
        };
        // 1 album match + artist-only matches until the cap
        assert_eq!(tracks.len(), DEFAULT_FALLBACK_CAP);
        assert_eq!(tracks[0].video_id, "rrrrrrrrrr0");
        assert!(tracks.iter().skip(1).all(|t| t.title == "Artist Only"));
    }

    #[tokio::test]
    async fn transport_failures_skip_to_next_variant() {
        struct FlakyCatalog {
            calls: AtomicUsize,
        }
        impl CatalogSearch for FlakyCatalog {
            async fn search_tracks(&self, _query: &str) -> anyhow::Result<Vec<Track>> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    anyhow::bail!("connection reset");
                }
                Ok(vec![track(
                    "aaaaaaaaaa1",
                    "One",
                    "Example Band",
                    Some("Greatest Hits"),
                )])
            }
            async fn related_tracks(&self, _video_id: &str) -> anyhow::Result<Vec<Track>> {
                Ok(Vec::new())
            }
        }

        let stub = FlakyCatalog {
            calls: AtomicUsize::new(0),
        };
        let query = AlbumQuery::new("Greatest Hits", "Example Band");

        let outcome = resolve_album_tracks(&stub, &query, DEFAULT_FALLBACK_CAP).await;

        let Resolution::Found(tracks) = outcome else {
            panic!("expected tracks despite two failing variants");
        };
        assert_eq!(tracks.len(), 1);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
    }
}
