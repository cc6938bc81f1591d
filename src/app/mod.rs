pub mod actions;
pub mod events;
pub mod state;

use std::num::NonZeroUsize;

use crate::art;
use crate::catalog::albums::{self, AlbumQuery, Resolution};
use crate::catalog::api::CatalogClient;
use crate::catalog::models::{SearchItem, SearchScope, Track};
use crate::config::Config;
use crate::download;
use crate::input;
use crate::lyrics::{self, LrclibClient, LyricSheet};
use crate::player::{AudioEngine, PlaybackSession};
use crate::storage::{self, StorageHandle};
use crate::tui::theme::Theme;
use crate::tui::{self, TuiTerminal};
use actions::Action;
use events::{Event, NetworkEvent, PlayerEvent};
use lru::LruCache;
use state::{AppState, Screen, SearchFocus, SelectList, Toast};
use tokio::sync::mpsc;
use tracing::debug;

/// Resolved album listings kept in memory, keyed by (title, artist).
const ALBUM_MEMO_CAP: usize = 32;

pub struct App {
    cfg: Config,
    theme: Theme,
    state: AppState,
    session: PlaybackSession,
    catalog: CatalogClient,
    lrclib: LrclibClient,
    http: reqwest::Client,
    storage: StorageHandle,
    album_memo: LruCache<(String, String), Vec<Track>>,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
}

impl App {
    pub fn new(cfg: Config) -> anyhow::Result<Self> {
        // The audio thread and every background task report back through
        // this channel, so it is created before any of them.
        let (tx, rx) = mpsc::channel::<Event>(256);

        let engine = AudioEngine::start(tx.clone(), cfg.volume_factor());
        let session = PlaybackSession::new(engine);
        let catalog = CatalogClient::new()?;
        let lrclib = LrclibClient::new();
        let http = reqwest::Client::new();
        let storage = StorageHandle::new(cfg.paths.data_dir.join("cache.sqlite3"));
        let theme = Theme::from_name(&cfg.ui.theme);

        let mut state = AppState::new();
        state.volume = cfg.player.volume.min(100);

        Ok(Self {
            cfg,
            theme,
            state,
            session,
            catalog,
            lrclib,
            http,
            storage,
            album_memo: LruCache::new(
                NonZeroUsize::new(ALBUM_MEMO_CAP).unwrap_or(NonZeroUsize::MIN),
            ),
            events_tx: tx,
            events_rx: rx,
        })
    }

    pub async fn run(&mut self, terminal: &mut TuiTerminal) -> anyhow::Result<()> {
        input::spawn_input_task(self.events_tx.clone());
        spawn_tick_task(self.events_tx.clone());

        // First draw
        tui::draw(terminal, &self.theme, &mut self.state)?;

        while let Some(ev) = self.events_rx.recv().await {
            match ev {
                Event::Input(input_ev) => {
                    if let Some(action) = input::map_input_to_action(&self.state, input_ev) {
                        self.handle_action(action);
                    }
                }
                Event::Player(pe) => self.handle_player(pe),
                Event::Network(ne) => self.handle_network(ne),
                Event::Tick => self.handle_tick(),
            }

            if self.state.should_quit {
                break;
            }

            tui::draw(terminal, &self.theme, &mut self.state)?;
        }

        self.session.shutdown();
        Ok(())
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::StartSearch => {
                self.spawn_search();
            }
            Action::Activate => match self.state.screen {
                Screen::Search => {
                    let item = self.state.search_list.selected_item().cloned();
                    match item {
                        Some(SearchItem::Track(track)) => self.play_track(track),
                        Some(SearchItem::Album(album)) => {
                            self.open_album(album.title, album.artist);
                        }
                        Some(SearchItem::Playlist(_)) => {
                            self.state.status = "Playlists cannot be opened".into();
                        }
                        None => {}
                    }
                }
                Screen::Album => {
                    if let Some(track) = self.state.album_list.selected_item().cloned() {
                        self.play_track(track);
                    }
                }
                _ => {}
            },
            Action::DownloadSelected => match self.state.screen {
                Screen::Search => match self.state.search_list.selected_item().cloned() {
                    Some(SearchItem::Track(track)) => {
                        let album = track.album.clone();
                        self.spawn_track_download(track, album, None);
                    }
                    Some(_) => {
                        self.state.status = "Open the album first".into();
                    }
                    None => {}
                },
                Screen::Album => {
                    if let Some(track) = self.state.album_list.selected_item().cloned() {
                        let album = self.state.album_header.as_ref().map(|(t, _)| t.clone());
                        let number = Some((
                            self.state.album_list.selected as u32 + 1,
                            self.state.album_list.items.len() as u32,
                        ));
                        self.spawn_track_download(track, album, number);
                    }
                }
                _ => {}
            },
            Action::DownloadAlbum => {
                if self.state.screen == Screen::Album {
                    self.spawn_album_download();
                }
            }
            Action::TogglePause => {
                self.session.toggle_pause();
                self.state.player = self.session.state();
            }
            Action::Stop => {
                self.session.stop();
                self.state.player = self.session.state();
                self.state.playback.clear();
                self.state.status = "Stopped".into();
            }
            Action::SeekForward => {
                if let Some(pos) = self.session.seek_by(5) {
                    self.state.playback.tick_position(Some(pos));
                }
            }
            Action::SeekBack => {
                if let Some(pos) = self.session.seek_by(-5) {
                    self.state.playback.tick_position(Some(pos));
                }
            }
            Action::VolumeUp => {
                let v = self.state.volume.saturating_add(5).min(100);
                self.state.volume = v;
                self.session.set_volume(f32::from(v) / 100.0);
            }
            Action::VolumeDown => {
                let v = self.state.volume.saturating_sub(5);
                self.state.volume = v;
                self.session.set_volume(f32::from(v) / 100.0);
            }
            _ => self.reduce(action),
        }
    }

    /// Pure state transitions; anything that spawns work or talks to the
    /// player lives in `handle_action`.
    fn reduce(&mut self, action: Action) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::NextScreen => {
                self.state.screen = self.state.screen.next();
                self.on_screen_change();
            }
            Action::PrevScreen => {
                self.state.screen = self.state.screen.prev();
                self.on_screen_change();
            }
            Action::SetScreen(screen) => {
                self.state.screen = screen;
                self.on_screen_change();
            }
            Action::SetSearchFocus(f) => self.state.search_focus = f,
            Action::BackToSearch => {
                self.state.screen = Screen::Search;
                self.state.search_focus = if self.state.search_list.items.is_empty() {
                    SearchFocus::Input
                } else {
                    SearchFocus::Results
                };
            }
            Action::InputChar(c) => self.state.search_query.push(c),
            Action::Backspace => {
                self.state.search_query.pop();
            }
            Action::ClearInput => self.state.search_query.clear(),
            Action::ListUp
            | Action::ListDown
            | Action::GoTop
            | Action::GoBottom
            | Action::PageUp
            | Action::PageDown => match self.state.screen {
                Screen::Search => nav_list(&mut self.state.search_list, &action),
                Screen::Album => nav_list(&mut self.state.album_list, &action),
                _ => {}
            },
            Action::Resize => {
                // Redrawn after every event anyway.
            }
            _ => {}
        }
    }

    fn on_screen_change(&mut self) {
        if self.state.screen == Screen::Search && self.state.search_list.items.is_empty() {
            self.state.search_focus = SearchFocus::Input;
        }
    }

    /// Start playing `track`: claim the session, then resolve the stream
    /// and fetch lyrics and cover art in parallel. Everything reports back
    /// tagged with the track id.
    fn play_track(&mut self, track: Track) {
        if let Err(err) = self.session.begin_loading(&track) {
            self.state.toast = Some(Toast::error(err.to_string()));
            return;
        }
        self.state.player = self.session.state();
        self.state.playback.begin(track.clone());
        self.state.status = format!("Loading: {}", track.title);

        self.spawn_stream_resolution(track.clone());
        self.spawn_lyrics_fetch(track.clone());
        self.spawn_cover_fetch(track);
    }

    fn spawn_search(&mut self) {
        if self.state.search_list.loading {
            return;
        }
        if self.state.search_query.trim().is_empty() {
            self.state.status = "Type a query first".into();
            return;
        }
        let query = self.state.search_query.trim().to_string();
        self.state.search_list.loading = true;
        self.state.status = format!("Searching: {query}");

        let catalog = self.catalog.clone();
        let limit = self.cfg.search.limit;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            match catalog.search(&query, SearchScope::All).await {
                Ok(mut items) => {
                    items.truncate(limit);
                    let _ = tx
                        .send(Event::Network(NetworkEvent::SearchResults { query, items }))
                        .await;
                }
                Err(e) => {
                    let _ = tx
                        .send(Event::Network(NetworkEvent::Error(format!("{e:#}"))))
                        .await;
                }
            }
        });
    }

    fn open_album(&mut self, album_title: String, artist: String) {
        let key = (album_title.clone(), artist.clone());
        if let Some(tracks) = self.album_memo.get(&key) {
            debug!(album_title, "album memo hit");
            self.state.album_header = Some(key);
            self.state.album_list.set_items(tracks.clone());
            self.state.screen = Screen::Album;
            return;
        }

        self.state.album_header = Some(key);
        self.state.album_list.clear();
        self.state.album_list.loading = true;
        self.state.screen = Screen::Album;
        self.state.status = format!("Resolving album: {album_title}");

        let catalog = self.catalog.clone();
        let fallback_cap = self.cfg.resolver.fallback_cap;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let query = AlbumQuery::new(&album_title, &artist);
            let ev = match albums::resolve_album_tracks(&catalog, &query, fallback_cap).await {
                Resolution::Found(tracks) => NetworkEvent::AlbumResolved {
                    album_title,
                    artist,
                    tracks,
                },
                Resolution::NotFound {
                    album_title,
                    artist,
                } => NetworkEvent::AlbumNotFound {
                    album_title,
                    artist,
                },
            };
            let _ = tx.send(Event::Network(ev)).await;
        });
    }

    fn spawn_stream_resolution(&self, track: Track) {
        let storage = self.storage.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let video_id = track.video_id.clone();
            let now = storage::now_unix();

            if let Ok(Ok(Some(url))) = tokio::task::spawn_blocking({
                let storage = storage.clone();
                let vid = video_id.clone();
                move || storage.get_stream_url(&vid, now)
            })
            .await
            {
                debug!(video_id, "stream url cache hit");
                let _ = tx
                    .send(Event::Network(NetworkEvent::StreamResolved {
                        video_id,
                        url,
                    }))
                    .await;
                return;
            }

            match crate::player::resolve::resolve_stream_url(&video_id).await {
                Ok(url) => {
                    let expires_at = now + storage::STREAM_URL_TTL_SECS;
                    let _ = tokio::task::spawn_blocking({
                        let storage = storage.clone();
                        let vid = video_id.clone();
                        let url = url.clone();
                        move || storage.cache_stream_url(&vid, &url, expires_at, now)
                    })
                    .await;
                    let _ = tx
                        .send(Event::Network(NetworkEvent::StreamResolved {
                            video_id,
                            url,
                        }))
                        .await;
                }
                Err(e) => {
                    let _ = tx
                        .send(Event::Network(NetworkEvent::StreamFailed {
                            video_id,
                            error: format!("{e:#}"),
                        }))
                        .await;
                }
            }
        });
    }

    fn spawn_lyrics_fetch(&self, track: Track) {
        let lrclib = self.lrclib.clone();
        let storage = self.storage.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let video_id = track.video_id.clone();

            if let Ok(Ok(Some((content, synced)))) = tokio::task::spawn_blocking({
                let storage = storage.clone();
                let vid = video_id.clone();
                move || storage.get_lyrics(&vid)
            })
            .await
            {
                debug!(video_id, "lyrics cache hit");
                let sheet = LyricSheet::parse(&content, synced);
                let _ = tx
                    .send(Event::Network(NetworkEvent::LyricsLoaded { video_id, sheet }))
                    .await;
                return;
            }

            let found = lyrics::fetch_lyrics(
                &lrclib,
                &track.title,
                &track.artist_line(),
                track.duration_seconds,
            )
            .await;

            match found {
                Some(sheet) => {
                    let _ = tokio::task::spawn_blocking({
                        let storage = storage.clone();
                        let vid = video_id.clone();
                        let content = sheet.to_lrc();
                        let synced = sheet.synced;
                        move || storage.cache_lyrics(&vid, &content, synced, storage::now_unix())
                    })
                    .await;
                    let _ = tx
                        .send(Event::Network(NetworkEvent::LyricsLoaded { video_id, sheet }))
                        .await;
                }
                None => {
                    let _ = tx
                        .send(Event::Network(NetworkEvent::LyricsUnavailable { video_id }))
                        .await;
                }
            }
        });
    }

    fn spawn_cover_fetch(&self, track: Track) {
        let Some(url) = track.thumbnail.clone() else {
            return;
        };
        let http = self.http.clone();
        let cache_dir = self.cfg.paths.data_dir.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            match art::fetch_cover(&http, &url, &cache_dir, &track.video_id).await {
                Ok(path) => {
                    let _ = tx
                        .send(Event::Network(NetworkEvent::CoverReady {
                            video_id: track.video_id,
                            path,
                        }))
                        .await;
                }
                Err(e) => {
                    // Cover art is decoration; playback goes on without it.
                    debug!(error = %e, "cover fetch failed");
                }
            }
        });
    }

    fn spawn_track_download(
        &mut self,
        track: Track,
        album: Option<String>,
        track_number: Option<(u32, u32)>,
    ) {
        if !track.has_playable_id() {
            self.state.toast = Some(Toast::error(format!(
                "cannot download this track: invalid track id {:?}",
                track.video_id
            )));
            return;
        }
        let id = self
            .state
            .downloads
            .begin(format!("{} - {}", track.artist_line(), track.title));
        self.state.status = format!("Downloading: {}", track.title);

        let http = self.http.clone();
        let dest_dir = self.cfg.downloads_dir();
        let cache_dir = self.cfg.paths.data_dir.clone();
        let quality = self.cfg.downloads.mp3_quality;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let stream_url = match crate::player::resolve::resolve_stream_url(&track.video_id).await
            {
                Ok(url) => url,
                Err(e) => {
                    let _ = tx
                        .send(Event::Network(NetworkEvent::DownloadFailed {
                            id,
                            error: format!("{e:#}"),
                        }))
                        .await;
                    return;
                }
            };
            let cover = match track.thumbnail.as_deref() {
                Some(url) => art::fetch_cover(&http, url, &cache_dir, &track.video_id)
                    .await
                    .ok(),
                None => None,
            };

            let file_name = format!(
                "{}.mp3",
                download::sanitize_file_name(&format!(
                    "{} - {}",
                    track.artist_line(),
                    track.title
                ))
            );
            let job = download::TrackJob {
                dest: dest_dir.join(file_name),
                track,
                stream_url,
                album,
                track_number,
                cover,
                quality,
            };

            let progress_tx = tx.clone();
            let result = download::download_track(&http, &job, &std::env::temp_dir(), |fraction| {
                // Progress is advisory; a full channel just drops a frame.
                let _ = progress_tx.try_send(Event::Network(NetworkEvent::DownloadProgress {
                    id,
                    fraction,
                    detail: None,
                }));
            })
            .await;

            let ev = match result {
                Ok(path) => NetworkEvent::DownloadFinished { id, path },
                Err(e) => NetworkEvent::DownloadFailed {
                    id,
                    error: format!("{e:#}"),
                },
            };
            let _ = tx.send(Event::Network(ev)).await;
        });
    }

    fn spawn_album_download(&mut self) {
        let Some((album_title, artist)) = self.state.album_header.clone() else {
            return;
        };
        let tracks = self.state.album_list.items.clone();
        if tracks.is_empty() {
            self.state.toast = Some(Toast::error("no tracks found in album"));
            return;
        }
        let id = self
            .state
            .downloads
            .begin(format!("{artist} - {album_title}"));
        self.state.status = format!("Downloading album: {album_title}");

        let http = self.http.clone();
        let dest_root = self.cfg.downloads_dir();
        let cache_dir = self.cfg.paths.data_dir.clone();
        let quality = self.cfg.downloads.mp3_quality;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            // One cover for the whole album, from the first track that has one.
            let mut cover = None;
            for t in &tracks {
                if let Some(url) = t.thumbnail.as_deref() {
                    cover = art::fetch_cover(&http, url, &cache_dir, &t.video_id).await.ok();
                    break;
                }
            }

            let job = download::AlbumJob {
                tracks,
                album_title,
                artist,
                dest_root,
                tmp_dir: std::env::temp_dir(),
                cover,
                quality,
            };

            let progress_tx = tx.clone();
            let result = download::download_album(&http, &job, |fraction, current| {
                let _ = progress_tx.try_send(Event::Network(NetworkEvent::DownloadProgress {
                    id,
                    fraction,
                    detail: Some(current.to_string()),
                }));
            })
            .await;

            let ev = match result {
                Ok(outcome) => NetworkEvent::DownloadFinished {
                    id,
                    path: outcome.dir,
                },
                Err(e) => NetworkEvent::DownloadFailed {
                    id,
                    error: format!("{e:#}"),
                },
            };
            let _ = tx.send(Event::Network(ev)).await;
        });
    }

    fn handle_player(&mut self, pe: PlayerEvent) {
        match pe {
            PlayerEvent::Ended => {
                // Stale when another track is already loading.
                if self.session.finish_playback() {
                    self.state.player = self.session.state();
                    self.state.playback.clear();
                    self.state.status = "Playback ended".into();
                }
            }
            PlayerEvent::Error(e) => {
                self.session.stop();
                self.state.player = self.session.state();
                self.state.playback.clear();
                self.state.toast = Some(Toast::error(e));
            }
        }
    }

    fn handle_network(&mut self, ne: NetworkEvent) {
        match ne {
            NetworkEvent::Error(e) => {
                self.state.search_list.loading = false;
                self.state.album_list.loading = false;
                self.state.toast = Some(Toast::error(e));
                self.state.status.clear();
            }
            NetworkEvent::SearchResults { query, items } => {
                if self.state.search_query.trim() != query {
                    debug!(query, "dropping stale search results");
                    self.state.search_list.loading = false;
                    return;
                }
                let count = items.len();
                self.state.last_search = Some(query);
                self.state.search_list.set_items(items);
                self.state.search_focus = SearchFocus::Results;
                self.state.status = format!("{count} results");
            }
            NetworkEvent::AlbumResolved {
                album_title,
                artist,
                tracks,
            } => {
                let is_current = self
                    .state
                    .album_header
                    .as_ref()
                    .is_some_and(|(t, a)| *t == album_title && *a == artist);
                if !is_current {
                    debug!(album_title, "dropping stale album resolution");
                    return;
                }
                self.album_memo
                    .put((album_title, artist), tracks.clone());
                self.state.status = format!("{} tracks", tracks.len());
                self.state.album_list.set_items(tracks);
            }
            NetworkEvent::AlbumNotFound {
                album_title,
                artist,
            } => {
                let is_current = self
                    .state
                    .album_header
                    .as_ref()
                    .is_some_and(|(t, a)| *t == album_title && *a == artist);
                if !is_current {
                    return;
                }
                self.state.album_list.loading = false;
                self.state.toast = Some(Toast::error(format!(
                    "No tracks found for \"{album_title}\""
                )));
            }
            NetworkEvent::StreamResolved { video_id, url } => {
                match self.session.attach_stream(&video_id, &url) {
                    Ok(true) => {
                        self.state.player = self.session.state();
                        if let Some(track) = self.session.current_track() {
                            self.state.status = format!("Playing: {}", track.title);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        self.state.player = self.session.state();
                        self.state.playback.clear();
                        self.state.toast = Some(Toast::error(format!("{e}")));
                    }
                }
            }
            NetworkEvent::StreamFailed { video_id, error } => {
                if self.session.fail_loading(&video_id) {
                    self.state.player = self.session.state();
                    self.state.playback.clear();
                    self.state.toast = Some(Toast::error(error));
                    self.state.status = "Playback failed".into();
                }
            }
            NetworkEvent::LyricsLoaded { video_id, sheet } => {
                self.state.playback.accept_lyrics(&video_id, sheet);
            }
            NetworkEvent::LyricsUnavailable { video_id } => {
                self.state.playback.mark_lyrics_unavailable(&video_id);
            }
            NetworkEvent::CoverReady { video_id, path } => {
                self.state.playback.accept_cover(&video_id, path);
            }
            NetworkEvent::DownloadProgress {
                id,
                fraction,
                detail,
            } => {
                self.state.downloads.progress(id, fraction, detail);
            }
            NetworkEvent::DownloadFinished { id, path } => {
                self.state.downloads.finish(id, path.clone());
                self.state.toast = Some(Toast::success(format!("Saved: {}", path.display())));
            }
            NetworkEvent::DownloadFailed { id, error } => {
                self.state.downloads.fail(id, error.clone());
                self.state.toast = Some(Toast::error(error));
            }
        }
    }

    fn handle_tick(&mut self) {
        self.state.tick = self.state.tick.wrapping_add(1);
        self.session.poll();
        self.state.player = self.session.state();
        self.state.playback.tick_position(self.session.position());
        if self.state.toast.as_ref().is_some_and(Toast::is_expired) {
            self.state.toast = None;
        }
    }
}

fn spawn_tick_task(tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_millis(200));
        loop {
            interval.tick().await;
            if tx.send(Event::Tick).await.is_err() {
                break;
            }
        }
    });
}

fn nav_list<T>(list: &mut SelectList<T>, action: &Action) {
    match action {
        Action::ListUp => list.select_prev(),
        Action::ListDown => list.select_next(),
        Action::GoTop => list.select_first(),
        Action::GoBottom => list.select_last(),
        Action::PageUp => list.page_up(10),
        Action::PageDown => list.page_down(10),
        _ => {}
    }
    list.update_scroll(20);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::SessionState;

    fn test_app() -> App {
        let (tx, rx) = mpsc::channel::<Event>(8);
        let cfg = Config::default();
        let mut state = AppState::new();
        state.volume = cfg.player.volume;
        App {
            cfg,
            theme: Theme::from_name("midnight"),
            state,
            session: PlaybackSession::new(AudioEngine::disconnected()),
            catalog: CatalogClient::new().expect("client"),
            lrclib: LrclibClient::new(),
            http: reqwest::Client::new(),
            storage: StorageHandle::new(std::env::temp_dir().join("encore-test.sqlite3")),
            album_memo: LruCache::new(NonZeroUsize::new(ALBUM_MEMO_CAP).unwrap()),
            events_tx: tx,
            events_rx: rx,
        }
    }

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

    #[test]
    fn stale_end_of_track_does_not_cancel_a_pending_load() {
        let mut app = test_app();
        let t = track("bbbbbbbbbb");
        app.session.begin_loading(&t).unwrap();
        app.state.playback.begin(t);
        app.state.player = SessionState::Loading;

        // The previous track's sink drained after the new load started.
        app.handle_player(PlayerEvent::Ended);
        assert_eq!(app.state.player, SessionState::Loading);
        assert_eq!(app.session.state(), SessionState::Loading);
        assert!(app.state.playback.track.is_some());
    }

    #[test]
    fn typed_characters_edit_the_query() {
        let mut app = test_app();
        app.handle_action(Action::InputChar('a'));
        app.handle_action(Action::InputChar('b'));
        app.handle_action(Action::Backspace);
        assert_eq!(app.state.search_query, "a");
        app.handle_action(Action::ClearInput);
        assert_eq!(app.state.search_query, "");
    }

    #[test]
    fn list_navigation_follows_the_screen() {
        let mut app = test_app();
        app.state.screen = Screen::Album;
        app.state
            .album_list
            .set_items(vec![track("aaaaaaaaaa"), track("bbbbbbbbbb")]);

        app.handle_action(Action::ListDown);
        assert_eq!(app.state.album_list.selected, 1);
        // the other screen's list is untouched
        assert_eq!(app.state.search_list.selected, 0);
    }

    #[test]
    fn unplayable_track_shows_a_toast_and_starts_nothing() {
        let mut app = test_app();
        app.play_track(track("short"));

        assert!(app.state.toast.is_some());
        assert!(app.state.playback.track.is_none());
        assert_eq!(app.state.player, SessionState::Idle);
    }

    #[test]
    fn memoized_albums_open_without_a_resolver_round_trip() {
        let mut app = test_app();
        let key = ("Greatest Hits".to_string(), "Example Band".to_string());
        app.album_memo
            .put(key, vec![track("aaaaaaaaaa"), track("bbbbbbbbbb")]);

        app.open_album("Greatest Hits".into(), "Example Band".into());

        assert_eq!(app.state.screen, Screen::Album);
        assert_eq!(app.state.album_list.items.len(), 2);
        assert!(!app.state.album_list.loading);
    }

    #[test]
    fn volume_steps_clamp_to_percent_range() {
        let mut app = test_app();
        app.state.volume = 97;
        app.handle_action(Action::VolumeUp);
        assert_eq!(app.state.volume, 100);
        app.state.volume = 3;
        app.handle_action(Action::VolumeDown);
        assert_eq!(app.state.volume, 0);
        app.handle_action(Action::VolumeDown);
        assert_eq!(app.state.volume, 0);
    }

    #[test]
    fn stale_album_resolutions_are_dropped() {
        let mut app = test_app();
        app.state.album_header = Some(("Other Album".into(), "Example Band".into()));

        app.handle_network(NetworkEvent::AlbumResolved {
            album_title: "Greatest Hits".into(),
            artist: "Example Band".into(),
            tracks: vec![track("aaaaaaaaaa")],
        });

        assert!(app.state.album_list.items.is_empty());
    }
}
