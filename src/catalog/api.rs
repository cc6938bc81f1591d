//! Catalog search client.
//!
//! Talks to the public innertube endpoint the music web client uses. No
//! authentication: search and related-tracks lookups work anonymously.
//! Responses are deeply nested JSON whose exact shape shifts over time,
//! so extraction is a best-effort scan for known renderer nodes rather
//! than a strict deserialization.

use crate::catalog::models::{AlbumRef, PlaylistRef, SearchItem, SearchScope, Track};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Every catalog call shares one short timeout; a slow variant is treated
/// like a failed one by callers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(7);

// Innertube "params" blobs that bias search toward one result type.
const TRACK_PARAMS: &str = "EgWKAQIIAWoKEAkQBRAKEAMQBA%3D%3D";
const ALBUM_PARAMS: &str = "EgWKAQIYAWoKEAkQBRAKEAMQBA%3D%3D";

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    bootstrap: OnceCell<Bootstrap>,
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    inner: Arc<Inner>,
}

#[derive(Debug, Clone)]
struct Bootstrap {
    api_key: String,
    client_version: String,
    visitor_data: Option<String>,
}

impl CatalogClient {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"),
        );
        headers.insert(ORIGIN, HeaderValue::from_static("https://music.youtube.com"));
        headers.insert(REFERER, HeaderValue::from_static("https://music.youtube.com/"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                bootstrap: OnceCell::new(),
            }),
        })
    }

    /// Search with a result-type hint, classified into the item union.
    pub async fn search(&self, query: &str, scope: SearchScope) -> anyhow::Result<Vec<SearchItem>> {
        let v = self.search_raw(query, scope).await?;
        Ok(extract_search_items(&v))
    }

    /// Track-scoped search, flattened to tracks only.
    pub async fn search_tracks(&self, query: &str) -> anyhow::Result<Vec<Track>> {
        let items = self.search(query, SearchScope::Tracks).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                SearchItem::Track(t) => Some(t),
                _ => None,
            })
            .collect())
    }

    pub async fn search_raw(
        &self,
        query: &str,
        scope: SearchScope,
    ) -> anyhow::Result<serde_json::Value> {
        let b = self.bootstrap().await?;

        let mut body = json!({
            "context": {
                "client": {
                    "clientName": "WEB_REMIX",
                    "clientVersion": b.client_version,
                }
            },
            "query": query,
        });
        if let Some(params) = scope_params(scope) {
            body["params"] = json!(params);
        }

        let v: serde_json::Value = self
            .innertube_post("search", &b)
            .json(&body)
            .send()
            .await
            .context("send search request")?
            .error_for_status()
            .context("search http status")?
            .json()
            .await
            .context("parse search json")?;
        Ok(v)
    }

    /// Related-tracks expansion seeded by a video id (the "next" endpoint's
    /// watch playlist). Used by the album resolver's fallback pass.
    pub async fn related_tracks(&self, video_id: &str) -> anyhow::Result<Vec<Track>> {
        let v = self.related_raw(video_id).await?;
        Ok(extract_related_tracks(&v))
    }

    pub async fn related_raw(&self, video_id: &str) -> anyhow::Result<serde_json::Value> {
        let b = self.bootstrap().await?;

        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB_REMIX",
                    "clientVersion": b.client_version,
                }
            },
            "videoId": video_id,
            "playlistId": format!("RDAMVM{video_id}"),
            "isAudioOnly": true
        });

        let v: serde_json::Value = self
            .innertube_post("next", &b)
            .json(&body)
            .send()
            .await
            .context("send related request")?
            .error_for_status()
            .context("related http status")?
            .json()
            .await
            .context("parse related json")?;

        Ok(v)
    }

    async fn bootstrap(&self) -> anyhow::Result<Bootstrap> {
        self.inner
            .bootstrap
            .get_or_try_init(|| async {
                let html = self
                    .inner
                    .http
                    .get("https://music.youtube.com/")
                    .send()
                    .await
                    .context("fetch music.youtube.com for bootstrap")?
                    .error_for_status()
                    .context("bootstrap http status")?
                    .text()
                    .await
                    .context("read bootstrap html")?;

                let api_key = parse_ytcfg_value(&html, "INNERTUBE_API_KEY")
                    .context("parse INNERTUBE_API_KEY")?;
                let client_version = parse_ytcfg_value(&html, "INNERTUBE_CLIENT_VERSION")
                    .context("parse INNERTUBE_CLIENT_VERSION")?;
                let visitor_data = parse_ytcfg_value(&html, "VISITOR_DATA");

                Ok(Bootstrap {
                    api_key,
                    client_version,
                    visitor_data,
                })
            })
            .await
            .cloned()
    }

    fn innertube_post(&self, path: &str, b: &Bootstrap) -> reqwest::RequestBuilder {
        let url = format!(
            "https://music.youtube.com/youtubei/v1/{path}?key={}&prettyPrint=false",
            b.api_key
        );

        let mut rb = self
            .inner
            .http
            .post(url)
            .header("X-Youtube-Client-Name", "67")
            .header("X-Youtube-Client-Version", b.client_version.as_str());

        if let Some(v) = b.visitor_data.as_deref() {
            rb = rb.header("X-Goog-Visitor-Id", v);
        }

        rb
    }
}

fn scope_params(scope: SearchScope) -> Option<&'static str> {
    match scope {
        SearchScope::All => None,
        SearchScope::Tracks => Some(TRACK_PARAMS),
        SearchScope::Albums => Some(ALBUM_PARAMS),
    }
}

fn extract_search_items(v: &serde_json::Value) -> Vec<SearchItem> {
    // We scan for `musicResponsiveListItemRenderer` nodes and classify each
    // one by what it links to.
    let mut out = Vec::new();
    scan_value(
        v,
        &mut |node| {
            let r = node.get("musicResponsiveListItemRenderer")?;
            classify_item(r)
        },
        &mut out,
    );
    out
}

fn classify_item(r: &serde_json::Value) -> Option<SearchItem> {
    let title = flex_run_text(r, 0)?;
    let thumbnail = extract_thumbnail(r);
    let mut segments = byline_segments(r);
    let label = strip_kind_label(&mut segments);

    if let Some(video_id) = extract_video_id_from_item(r) {
        return Some(SearchItem::Track(build_track(
            video_id, title, thumbnail, segments, label,
        )));
    }

    let page_type = r
        .pointer("/navigationEndpoint/browseEndpoint/browseEndpointContextSupportedConfigs/browseEndpointContextMusicConfig/pageType")
        .and_then(|x| x.as_str());

    match (page_type, label.as_deref()) {
        (Some("MUSIC_PAGE_TYPE_ALBUM"), _) | (None, Some("album" | "ep" | "single")) => {
            let artist = segments.first().map(|s| s.join(" ")).unwrap_or_default();
            let year = segments
                .iter()
                .filter_map(|s| s.first())
                .find(|t| t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()))
                .cloned();
            Some(SearchItem::Album(AlbumRef {
                title,
                artist,
                thumbnail,
                year,
                track_count: segments.iter().find_map(|s| parse_track_count(s)),
            }))
        }
        (Some("MUSIC_PAGE_TYPE_PLAYLIST"), _) | (None, Some("playlist")) => {
            let author = segments.first().map(|s| s.join(" ")).unwrap_or_default();
            Some(SearchItem::Playlist(PlaylistRef {
                title,
                author,
                thumbnail,
                track_count: segments.iter().find_map(|s| parse_track_count(s)),
            }))
        }
        _ => None,
    }
}

fn build_track(
    video_id: String,
    title: String,
    thumbnail: Option<String>,
    segments: Vec<Vec<String>>,
    label: Option<String>,
) -> Track {
    let artists: Vec<String> = segments
        .first()
        .map(|s| s.iter().map(|t| t.to_string()).collect())
        .unwrap_or_default();

    // Song bylines read "Artist • Album • 3:45". Video bylines carry view
    // counts instead of an album, so only song-shaped rows get one.
    let album = match label.as_deref() {
        None | Some("song") => segments
            .get(1)
            .map(|s| s.join(" "))
            .filter(|t| !t.is_empty() && parse_duration_text(t).is_none() && !is_count_text(t)),
        _ => None,
    };

    let duration_seconds = segments
        .last()
        .and_then(|s| s.first())
        .and_then(|t| parse_duration_text(t));

    Track {
        video_id,
        title,
        artists,
        album,
        thumbnail,
        duration_seconds,
    }
}

fn extract_related_tracks(v: &serde_json::Value) -> Vec<Track> {
    // The watch playlist uses a different renderer than search does.
    let mut out = Vec::new();
    scan_value(
        v,
        &mut |node| {
            let r = node.get("playlistPanelVideoRenderer")?;

            let video_id = r
                .get("videoId")
                .and_then(|x| x.as_str())
                .map(|s| s.to_string())
                .or_else(|| {
                    r.pointer("/navigationEndpoint/watchEndpoint/videoId")
                        .and_then(|x| x.as_str())
                        .map(|s| s.to_string())
                })?;

            let title = r
                .pointer("/title/runs/0/text")
                .and_then(|x| x.as_str())
                .unwrap_or("Unknown title")
                .to_string();

            let segments = run_segments(r.pointer("/longBylineText/runs"));
            let artists: Vec<String> = segments.first().cloned().unwrap_or_default();
            let album = segments
                .get(1)
                .map(|s| s.join(" "))
                .filter(|t| !t.is_empty() && !is_count_text(t));

            let duration_seconds = r
                .pointer("/lengthText/runs/0/text")
                .and_then(|x| x.as_str())
                .and_then(parse_duration_text);

            Some(Track {
                video_id,
                title,
                artists,
                album,
                thumbnail: extract_thumbnail(r),
                duration_seconds,
            })
        },
        &mut out,
    );
    out
}

/// Byline runs split into segments at " • " separators. Within a segment,
/// joiner runs like " & " are dropped so only the names remain.
fn byline_segments(r: &serde_json::Value) -> Vec<Vec<String>> {
    run_segments(r.pointer("/flexColumns/1/musicResponsiveListItemFlexColumnRenderer/text/runs"))
}

fn run_segments(runs: Option<&serde_json::Value>) -> Vec<Vec<String>> {
    let mut segments: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let Some(runs) = runs.and_then(|x| x.as_array()) else {
        return segments;
    };
    for run in runs {
        let Some(text) = run.get("text").and_then(|t| t.as_str()) else {
            continue;
        };
        if text == " • " {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else if text != " & " && text != ", " {
            current.push(text.to_string());
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// General-scope rows label themselves with a leading kind segment
/// ("Song", "Album", ...). Removes and returns it, lowercased.
fn strip_kind_label(segments: &mut Vec<Vec<String>>) -> Option<String> {
    const LABELS: &[&str] = &["song", "video", "album", "ep", "single", "playlist", "artist"];
    let first = segments.first()?;
    if first.len() == 1 {
        let lowered = first[0].to_lowercase();
        if LABELS.contains(&lowered.as_str()) {
            segments.remove(0);
            return Some(lowered);
        }
    }
    None
}

fn parse_track_count(segment: &[String]) -> Option<u32> {
    let text = segment.first()?;
    let (count, rest) = text.split_once(' ')?;
    if rest == "songs" || rest == "song" || rest == "tracks" || rest == "track" {
        count.parse().ok()
    } else {
        None
    }
}

fn is_count_text(text: &str) -> bool {
    text.ends_with(" views") || text.ends_with(" plays") || text.ends_with(" likes")
}

/// Parse duration text like "3:45" or "1:23:45" into seconds
fn parse_duration_text(text: &str) -> Option<u32> {
    let parts: Vec<&str> = text.split(':').collect();
    match parts.len() {
        2 => {
            let mins: u32 = parts[0].parse().ok()?;
            let secs: u32 = parts[1].parse().ok()?;
            Some(mins * 60 + secs)
        }
        3 => {
            let hours: u32 = parts[0].parse().ok()?;
            let mins: u32 = parts[1].parse().ok()?;
            let secs: u32 = parts[2].parse().ok()?;
            Some(hours * 3600 + mins * 60 + secs)
        }
        _ => None,
    }
}

fn flex_run_text(r: &serde_json::Value, column: usize) -> Option<String> {
    r.pointer(&format!(
        "/flexColumns/{column}/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text"
    ))
    .and_then(|x| x.as_str())
    .map(|s| s.to_string())
}

fn extract_video_id_from_item(r: &serde_json::Value) -> Option<String> {
    // Seen variants:
    // - navigationEndpoint.watchEndpoint.videoId on the renderer itself
    // - the title run's navigationEndpoint.watchEndpoint.videoId
    // - playlistItemData.videoId
    r.pointer("/navigationEndpoint/watchEndpoint/videoId")
        .and_then(|x| x.as_str())
        .map(|s| s.to_string())
        .or_else(|| {
            r.pointer(
                "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/navigationEndpoint/watchEndpoint/videoId",
            )
            .and_then(|x| x.as_str())
            .map(|s| s.to_string())
        })
        .or_else(|| {
            r.pointer("/playlistItemData/videoId")
                .and_then(|x| x.as_str())
                .map(|s| s.to_string())
        })
}

fn extract_thumbnail(r: &serde_json::Value) -> Option<String> {
    let thumbs = r
        .pointer("/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails")
        .or_else(|| r.pointer("/thumbnail/thumbnails"))
        .and_then(|x| x.as_array())?;
    // Largest rendition last.
    thumbs
        .last()
        .and_then(|t| t.get("url"))
        .and_then(|u| u.as_str())
        .map(|s| s.to_string())
}

fn parse_ytcfg_value(html: &str, key: &str) -> Option<String> {
    // We look for `"KEY":"value"` occurrences in the initial HTML ytcfg payload.
    let needle = format!("{key}\":\"");
    let idx = html.find(&needle)?;
    let start = idx + needle.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn scan_value<T, F>(v: &serde_json::Value, f: &mut F, out: &mut Vec<T>)
where
    F: FnMut(&serde_json::Value) -> Option<T>,
{
    if let Some(t) = f(v) {
        out.push(t);
        // keep scanning; duplicates are possible and filtered by callers
    }
    match v {
        serde_json::Value::Array(a) => {
            for x in a {
                scan_value(x, f, out);
            }
        }
        serde_json::Value::Object(o) => {
            for (_, x) in o {
                scan_value(x, f, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song_row() -> serde_json::Value {
        json!({
            "musicResponsiveListItemRenderer": {
                "flexColumns": [
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [
                        { "text": "Great Song",
                          "navigationEndpoint": { "watchEndpoint": { "videoId": "dQw4w9WgXcQ" } } }
                    ] } } },
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [
                        { "text": "Song" }, { "text": " • " },
                        { "text": "Example Band" }, { "text": " & " }, { "text": "Friend" },
                        { "text": " • " },
                        { "text": "Greatest Hits" }, { "text": " • " },
                        { "text": "3:45" }
                    ] } } }
                ]
            }
        })
    }

    fn album_row() -> serde_json::Value {
        json!({
            "musicResponsiveListItemRenderer": {
                "navigationEndpoint": { "browseEndpoint": {
                    "browseId": "MPREb_abc",
                    "browseEndpointContextSupportedConfigs": {
                        "browseEndpointContextMusicConfig": { "pageType": "MUSIC_PAGE_TYPE_ALBUM" }
                    }
                } },
                "flexColumns": [
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [
                        { "text": "Greatest Hits" }
                    ] } } },
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [
                        { "text": "Album" }, { "text": " • " },
                        { "text": "Example Band" }, { "text": " • " },
                        { "text": "1999" }
                    ] } } }
                ]
            }
        })
    }

    #[test]
    fn classifies_song_rows() {
        let items = extract_search_items(&json!({ "contents": [song_row()] }));
        assert_eq!(items.len(), 1);
        match &items[0] {
            SearchItem::Track(t) => {
                assert_eq!(t.video_id, "dQw4w9WgXcQ");
                assert_eq!(t.title, "Great Song");
                assert_eq!(t.artists, vec!["Example Band", "Friend"]);
                assert_eq!(t.album.as_deref(), Some("Greatest Hits"));
                assert_eq!(t.duration_seconds, Some(225));
            }
            other => panic!("expected track, got {other:?}"),
        }
    }

    #[test]
    fn classifies_album_rows() {
        let items = extract_search_items(&json!({ "contents": [album_row()] }));
        assert_eq!(items.len(), 1);
        match &items[0] {
            SearchItem::Album(a) => {
                assert_eq!(a.title, "Greatest Hits");
                assert_eq!(a.artist, "Example Band");
                assert_eq!(a.year.as_deref(), Some("1999"));
            }
            other => panic!("expected album, got {other:?}"),
        }
    }

    #[test]
    fn related_tracks_carry_album_and_duration() {
        let v = json!({ "contents": [ { "playlistPanelVideoRenderer": {
            "videoId": "abcdefghijk",
            "title": { "runs": [ { "text": "Deep Cut" } ] },
            "longBylineText": { "runs": [
                { "text": "Example Band" }, { "text": " • " },
                { "text": "Greatest Hits" }, { "text": " • " },
                { "text": "12M views" }
            ] },
            "lengthText": { "runs": [ { "text": "4:05" } ] }
        } } ] });
        let tracks = extract_related_tracks(&v);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].album.as_deref(), Some("Greatest Hits"));
        assert_eq!(tracks[0].duration_seconds, Some(245));
    }

    #[test]
    fn duration_text_forms() {
        assert_eq!(parse_duration_text("3:45"), Some(225));
        assert_eq!(parse_duration_text("1:23:45"), Some(5025));
        assert_eq!(parse_duration_text("12M views"), None);
    }
}
