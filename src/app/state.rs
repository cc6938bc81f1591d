use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::models::{SearchItem, Track};
use crate::lyrics::LyricSheet;
use crate::player::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Search,
    Album,
    NowPlaying,
    Downloads,
    Help,
}

impl Screen {
    pub fn next(self) -> Self {
        match self {
            Screen::Search => Screen::Album,
            Screen::Album => Screen::NowPlaying,
            Screen::NowPlaying => Screen::Downloads,
            Screen::Downloads => Screen::Help,
            Screen::Help => Screen::Search,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Screen::Search => Screen::Help,
            Screen::Album => Screen::Search,
            Screen::NowPlaying => Screen::Album,
            Screen::Downloads => Screen::NowPlaying,
            Screen::Help => Screen::Downloads,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Search => "Search",
            Screen::Album => "Album",
            Screen::NowPlaying => "Now Playing",
            Screen::Downloads => "Downloads",
            Screen::Help => "Help",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    Input,
    Results,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > std::time::Duration::from_secs(3)
    }
}

/// Selection + scroll state for one screen's list.
#[derive(Debug, Clone)]
pub struct SelectList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub loading: bool,
}

impl<T> Default for SelectList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            loading: false,
        }
    }
}

impl<T> SelectList<T> {
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1).min(self.items.len() - 1);
        }
    }

    pub fn page_up(&mut self, page: usize) {
        self.selected = self.selected.saturating_sub(page);
    }

    pub fn page_down(&mut self, page: usize) {
        if !self.items.is_empty() {
            self.selected = (self.selected + page).min(self.items.len() - 1);
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.selected = 0;
        self.scroll_offset = 0;
        self.loading = false;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = 0;
        self.scroll_offset = 0;
        self.loading = false;
    }

    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }
}

/// What the now-playing screen shows for the active track. Lyric and
/// cover results arrive from background tasks tagged with the track id
/// they were fetched for; the accessors here drop anything that no longer
/// matches, which also covers results landing after stop cleared the view.
#[derive(Debug, Clone, Default)]
pub struct PlaybackView {
    pub track: Option<Track>,
    pub position: Option<Duration>,
    pub lyrics: Option<LyricSheet>,
    pub lyrics_unavailable: bool,
    pub lyric_index: Option<usize>,
    pub cover: Option<PathBuf>,
}

impl PlaybackView {
    /// Install `track` as the active one and drop everything fetched for
    /// the previous track.
    pub fn begin(&mut self, track: Track) {
        *self = Self {
            track: Some(track),
            ..Self::default()
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_current(&self, video_id: &str) -> bool {
        self.track.as_ref().is_some_and(|t| t.video_id == video_id)
    }

    pub fn accept_lyrics(&mut self, video_id: &str, sheet: LyricSheet) -> bool {
        if !self.is_current(video_id) {
            return false;
        }
        self.lyrics = Some(sheet);
        self.lyrics_unavailable = false;
        self.lyric_index = None;
        true
    }

    pub fn mark_lyrics_unavailable(&mut self, video_id: &str) -> bool {
        if !self.is_current(video_id) {
            return false;
        }
        self.lyrics = None;
        self.lyrics_unavailable = true;
        true
    }

    pub fn accept_cover(&mut self, video_id: &str, path: PathBuf) -> bool {
        if !self.is_current(video_id) {
            return false;
        }
        self.cover = Some(path);
        true
    }

    /// Record the sampled position and recompute which lyric line is
    /// current. Runs on every tick; advisory only.
    pub fn tick_position(&mut self, position: Option<Duration>) {
        self.position = position;
        self.lyric_index = match (&self.lyrics, position) {
            (Some(sheet), Some(pos)) => sheet.line_index_at(pos.as_millis() as u64),
            _ => None,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadStatus {
    Running,
    Done(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: u64,
    pub label: String,
    pub detail: Option<String>,
    pub fraction: f64,
    pub status: DownloadStatus,
}

/// Active and finished download jobs, newest last.
#[derive(Debug, Clone, Default)]
pub struct DownloadsState {
    pub jobs: Vec<DownloadJob>,
    next_id: u64,
}

impl DownloadsState {
    pub fn begin(&mut self, label: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(DownloadJob {
            id,
            label: label.into(),
            detail: None,
            fraction: 0.0,
            status: DownloadStatus::Running,
        });
        id
    }

    pub fn progress(&mut self, id: u64, fraction: f64, detail: Option<String>) {
        if let Some(job) = self.job_mut(id) {
            job.fraction = fraction.clamp(0.0, 1.0);
            if detail.is_some() {
                job.detail = detail;
            }
        }
    }

    pub fn finish(&mut self, id: u64, path: PathBuf) {
        if let Some(job) = self.job_mut(id) {
            job.fraction = 1.0;
            job.status = DownloadStatus::Done(path);
        }
    }

    pub fn fail(&mut self, id: u64, error: String) {
        if let Some(job) = self.job_mut(id) {
            job.status = DownloadStatus::Failed(error);
        }
    }

    pub fn running(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == DownloadStatus::Running)
            .count()
    }

    fn job_mut(&mut self, id: u64) -> Option<&mut DownloadJob> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }
}

pub struct AppState {
    pub should_quit: bool,
    pub tick: u64,

    pub screen: Screen,

    // Search
    pub search_query: String,
    pub last_search: Option<String>,
    pub search_focus: SearchFocus,
    pub search_list: SelectList<SearchItem>,

    // Album view
    pub album_list: SelectList<Track>,
    pub album_header: Option<(String, String)>,

    // Playback
    pub playback: PlaybackView,
    pub player: SessionState,
    pub volume: u8,

    pub downloads: DownloadsState,

    pub toast: Option<Toast>,
    pub status: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            tick: 0,
            screen: Screen::Search,
            search_query: String::new(),
            last_search: None,
            search_focus: SearchFocus::Input,
            search_list: SelectList::default(),
            album_list: SelectList::default(),
            album_header: None,
            playback: PlaybackView::default(),
            player: SessionState::Idle,
            volume: 80,
            toast: None,
            status: String::new(),
            downloads: DownloadsState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::LyricSheet;

    fn track(id: &str) -> Track {
        Track {
            video_id: id.into(),
            title: "Song".into(),
            artists: vec!["Band".into()],
            album: None,
            thumbnail: None,
            duration_seconds: Some(200),
        }
    }

    fn sheet() -> LyricSheet {
        LyricSheet::parse("[00:01.00]one\n[00:10.00]two", true)
    }

    #[test]
    fn lyrics_for_the_active_track_are_applied() {
        let mut view = PlaybackView::default();
        view.begin(track("aaaaaaaaaa"));
        assert!(view.accept_lyrics("aaaaaaaaaa", sheet()));
        assert!(view.lyrics.is_some());
    }

    #[test]
    fn late_lyrics_after_stop_do_not_repopulate_cleared_state() {
        let mut view = PlaybackView::default();
        view.begin(track("aaaaaaaaaa"));
        view.clear();

        assert!(!view.accept_lyrics("aaaaaaaaaa", sheet()));
        assert!(view.lyrics.is_none());
        assert!(view.lyric_index.is_none());
    }

    #[test]
    fn results_for_a_replaced_track_are_dropped() {
        let mut view = PlaybackView::default();
        view.begin(track("aaaaaaaaaa"));
        view.begin(track("bbbbbbbbbb"));

        assert!(!view.accept_lyrics("aaaaaaaaaa", sheet()));
        assert!(!view.accept_cover("aaaaaaaaaa", PathBuf::from("/tmp/a.jpg")));
        assert!(view.accept_lyrics("bbbbbbbbbb", sheet()));
        assert!(view.accept_cover("bbbbbbbbbb", PathBuf::from("/tmp/b.jpg")));
    }

    #[test]
    fn tick_recomputes_the_lyric_index_from_position() {
        let mut view = PlaybackView::default();
        view.begin(track("aaaaaaaaaa"));
        view.accept_lyrics("aaaaaaaaaa", sheet());

        view.tick_position(Some(Duration::from_millis(500)));
        assert_eq!(view.lyric_index, None);

        view.tick_position(Some(Duration::from_secs(5)));
        assert_eq!(view.lyric_index, Some(0));

        view.tick_position(Some(Duration::from_secs(30)));
        assert_eq!(view.lyric_index, Some(1));

        view.tick_position(None);
        assert_eq!(view.lyric_index, None);
    }

    #[test]
    fn select_list_clamps_at_both_ends() {
        let mut list = SelectList::default();
        list.set_items(vec![1, 2, 3]);
        list.select_prev();
        assert_eq!(list.selected, 0);
        list.page_down(10);
        assert_eq!(list.selected, 2);
        list.select_next();
        assert_eq!(list.selected, 2);
    }

    #[test]
    fn download_jobs_track_their_lifecycle() {
        let mut downloads = DownloadsState::default();
        let a = downloads.begin("Song A");
        let b = downloads.begin("Album B");
        assert_eq!(downloads.running(), 2);

        downloads.progress(a, 0.5, None);
        downloads.finish(a, PathBuf::from("/out/a.mp3"));
        downloads.fail(b, "network".into());

        assert_eq!(downloads.running(), 0);
        assert_eq!(downloads.jobs[0].fraction, 1.0);
        assert!(matches!(downloads.jobs[1].status, DownloadStatus::Failed(_)));
    }
}
