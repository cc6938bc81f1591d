use std::path::PathBuf;

use crate::catalog::models::{SearchItem, Track};
use crate::lyrics::LyricSheet;

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Player(PlayerEvent),
    Network(NetworkEvent),
    /// 200 ms heartbeat; drives the lyric index and toast expiry.
    Tick,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize,
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Ended,
    Error(String),
}

/// Results of background work. Everything tied to one track carries the
/// id it was launched for, so stale arrivals can be compared and dropped.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    Error(String),
    SearchResults {
        query: String,
        items: Vec<SearchItem>,
    },
    AlbumResolved {
        album_title: String,
        artist: String,
        tracks: Vec<Track>,
    },
    AlbumNotFound {
        album_title: String,
        artist: String,
    },
    StreamResolved {
        video_id: String,
        url: String,
    },
    StreamFailed {
        video_id: String,
        error: String,
    },
    LyricsLoaded {
        video_id: String,
        sheet: LyricSheet,
    },
    LyricsUnavailable {
        video_id: String,
    },
    CoverReady {
        video_id: String,
        path: PathBuf,
    },
    DownloadProgress {
        id: u64,
        fraction: f64,
        detail: Option<String>,
    },
    DownloadFinished {
        id: u64,
        path: PathBuf,
    },
    DownloadFailed {
        id: u64,
        error: String,
    },
}
