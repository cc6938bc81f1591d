use serde::{Deserialize, Serialize};

/// Identifiers shorter than this cannot be resolved by the audio backend
/// and are rejected before any network activity.
pub const MIN_VIDEO_ID_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub video_id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl Track {
    pub fn has_playable_id(&self) -> bool {
        self.video_id.len() >= MIN_VIDEO_ID_LEN
    }

    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// Album row from a search response. The catalog exposes no direct album
/// browse here, so there is no identifier; activation goes through the
/// album resolver with title and artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub title: String,
    pub artist: String,
    pub thumbnail: Option<String>,
    pub year: Option<String>,
    pub track_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRef {
    pub title: String,
    pub author: String,
    pub thumbnail: Option<String>,
    pub track_count: Option<u32>,
}

/// One classified row of a search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchItem {
    Track(Track),
    Album(AlbumRef),
    Playlist(PlaylistRef),
}

impl SearchItem {
    pub fn title(&self) -> &str {
        match self {
            SearchItem::Track(t) => &t.title,
            SearchItem::Album(a) => &a.title,
            SearchItem::Playlist(p) => &p.title,
        }
    }
}

/// Result-type hint sent with a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    All,
    Tracks,
    Albums,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(video_id: &str) -> Track {
        Track {
            video_id: video_id.to_string(),
            title: "t".to_string(),
            artists: vec!["a".to_string()],
            album: None,
            thumbnail: None,
            duration_seconds: None,
        }
    }

    #[test]
    fn id_validity_boundary() {
        assert!(!track("123456789").has_playable_id());
        assert!(track("1234567890").has_playable_id());
        assert!(track("dQw4w9WgXcQ").has_playable_id());
    }

    #[test]
    fn artist_line_joins_names() {
        let mut t = track("1234567890");
        t.artists = vec!["One".to_string(), "Two".to_string()];
        assert_eq!(t.artist_line(), "One, Two");
    }
}
