//! Playback session state machine.
//!
//! A session owns at most one pipeline at a time. The pipeline is a sum
//! type over what is actually held, so teardown is a single match and a
//! half-dead state (process gone but buffer still playing) is
//! representable as its own variant rather than a pile of nullable fields.

use std::mem;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Child;
use tracing::debug;

use super::engine::AudioEngine;
use super::pcm::PcmBuffer;
use super::transcode;
use crate::catalog::models::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// A track was chosen; its stream locator is being resolved.
    Loading,
    Playing,
    Paused,
    /// Loading or pipeline setup failed. Holds no resources; the next
    /// start or stop leaves it.
    Error,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot play this track: invalid track id {0:?}")]
    InvalidId(String),
    #[error(transparent)]
    Pipeline(#[from] anyhow::Error),
}

enum Pipeline {
    Idle,
    /// Stream fully buffered in memory; no external process remains.
    Decoded { pcm: PcmBuffer },
    /// ffmpeg is still feeding the buffer.
    Transcoding { pcm: PcmBuffer, transcoder: Child },
}

impl Pipeline {
    fn pcm(&self) -> Option<&PcmBuffer> {
        match self {
            Pipeline::Idle => None,
            Pipeline::Decoded { pcm } | Pipeline::Transcoding { pcm, .. } => Some(pcm),
        }
    }

    /// Release whatever this variant holds and become `Idle`.
    fn teardown(&mut self, engine: &AudioEngine) {
        match mem::replace(self, Pipeline::Idle) {
            Pipeline::Idle => {}
            Pipeline::Decoded { .. } => engine.stop(),
            Pipeline::Transcoding { mut transcoder, .. } => {
                let _ = transcoder.start_kill();
                engine.stop();
            }
        }
    }
}

pub struct PlaybackSession {
    engine: AudioEngine,
    pipeline: Pipeline,
    state: SessionState,
    current: Option<Track>,
}

impl PlaybackSession {
    pub fn new(engine: AudioEngine) -> Self {
        Self {
            engine,
            pipeline: Pipeline::Idle,
            state: SessionState::Idle,
            current: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn is_current(&self, video_id: &str) -> bool {
        self.current.as_ref().is_some_and(|t| t.video_id == video_id)
    }

    /// Begin playing `track`: tear down the previous pipeline and enter
    /// `Loading`. Tracks without a playable id are rejected here, before
    /// any resolution work is spent on them.
    pub fn begin_loading(&mut self, track: &Track) -> Result<(), SessionError> {
        if !track.has_playable_id() {
            return Err(SessionError::InvalidId(track.video_id.clone()));
        }
        self.pipeline.teardown(&self.engine);
        self.current = Some(track.clone());
        self.state = SessionState::Loading;
        Ok(())
    }

    /// Attach a resolved stream URL: spawn the transcoder and start the
    /// output. Returns `Ok(false)` when the URL belongs to a track that is
    /// no longer the one loading, which happens when the user moved on
    /// before resolution finished.
    pub fn attach_stream(&mut self, video_id: &str, stream_url: &str) -> Result<bool, SessionError> {
        if self.state != SessionState::Loading || !self.is_current(video_id) {
            debug!(video_id, "stream url arrived for a track no longer loading");
            return Ok(false);
        }
        let pcm = PcmBuffer::new();
        let (mut transcoder, _feeder) = match transcode::spawn(stream_url, pcm.clone()) {
            Ok(parts) => parts,
            Err(err) => {
                self.state = SessionState::Error;
                return Err(SessionError::Pipeline(err));
            }
        };
        if let Err(err) = self.engine.play(pcm.clone()) {
            let _ = transcoder.start_kill();
            self.state = SessionState::Error;
            return Err(SessionError::Pipeline(err));
        }
        self.pipeline = Pipeline::Transcoding { pcm, transcoder };
        self.state = SessionState::Playing;
        Ok(true)
    }

    /// Record that stream resolution failed for `video_id`. Stale failures
    /// are ignored the same way stale URLs are.
    pub fn fail_loading(&mut self, video_id: &str) -> bool {
        if self.state != SessionState::Loading || !self.is_current(video_id) {
            return false;
        }
        self.pipeline.teardown(&self.engine);
        self.state = SessionState::Error;
        true
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            SessionState::Playing => {
                self.engine.set_paused(true);
                self.state = SessionState::Paused;
            }
            SessionState::Paused => {
                self.engine.set_paused(false);
                self.state = SessionState::Playing;
            }
            _ => {}
        }
    }

    /// Move the play cursor by `delta_secs`, clamped to the decoded range.
    /// Returns the new position, or `None` when nothing is playing yet.
    pub fn seek_by(&mut self, delta_secs: i64) -> Option<Duration> {
        match self.state {
            SessionState::Playing | SessionState::Paused => {
                self.pipeline.pcm().map(|pcm| pcm.seek_by(delta_secs))
            }
            _ => None,
        }
    }

    pub fn position(&self) -> Option<Duration> {
        match self.state {
            SessionState::Playing | SessionState::Paused => {
                self.pipeline.pcm().map(PcmBuffer::position)
            }
            _ => None,
        }
    }

    /// Handle the engine's end-of-track report. The drain check runs on a
    /// timeout, so the report can land after the user already activated
    /// another track; a drained sink can only belong to a pipeline that
    /// `begin_loading` tore down, and is ignored unless something is
    /// actually playing. Returns whether the session was released.
    pub fn finish_playback(&mut self) -> bool {
        match self.state {
            SessionState::Playing | SessionState::Paused => {
                self.stop();
                true
            }
            _ => {
                debug!("ignoring end-of-track outside active playback");
                false
            }
        }
    }

    /// Stop playback and release everything. Succeeds from any state and
    /// is a no-op when already idle.
    pub fn stop(&mut self) {
        self.pipeline.teardown(&self.engine);
        self.current = None;
        self.state = SessionState::Idle;
    }

    /// Reap the transcoder once it exits. The buffer then carries the
    /// whole stream, so the pipeline downgrades to `Decoded`.
    pub fn poll(&mut self) {
        let exited = match &mut self.pipeline {
            Pipeline::Transcoding { transcoder, .. } => match transcoder.try_wait() {
                Ok(Some(status)) => {
                    debug!(%status, "transcoder exited, stream fully buffered");
                    true
                }
                Ok(None) => false,
                Err(err) => {
                    debug!("transcoder wait failed: {err:#}");
                    false
                }
            },
            _ => false,
        };
        if exited {
            if let Pipeline::Transcoding { pcm, .. } =
                mem::replace(&mut self.pipeline, Pipeline::Idle)
            {
                self.pipeline = Pipeline::Decoded { pcm };
            }
        }
    }

    pub fn set_volume(&self, volume: f32) {
        self.engine.set_volume(volume);
    }

    pub fn shutdown(&mut self) {
        self.stop();
        self.engine.shutdown();
    }

    #[cfg(test)]
    fn attach_decoded(&mut self, track: Track, pcm: PcmBuffer) {
        self.current = Some(track);
        self.pipeline = Pipeline::Decoded { pcm };
        self.state = SessionState::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            video_id: id.into(),
            title: "Song".into(),
            artists: vec!["Band".into()],
            album: None,
            thumbnail: None,
            duration_seconds: Some(180),
        }
    }

    fn session() -> PlaybackSession {
        PlaybackSession::new(AudioEngine::disconnected())
    }

    #[test]
    fn short_ids_are_rejected_before_any_work() {
        let mut s = session();
        let err = s.begin_loading(&track("short")).unwrap_err();
        assert!(matches!(err, SessionError::InvalidId(_)));
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.current_track().is_none());
        assert_eq!(s.position(), None);
    }

    #[test]
    fn loading_holds_identity_until_stopped() {
        let mut s = session();
        s.begin_loading(&track("aaaaaaaaaa")).unwrap();
        assert_eq!(s.state(), SessionState::Loading);
        assert!(s.is_current("aaaaaaaaaa"));
        assert_eq!(s.position(), None);

        s.stop();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.current_track().is_none());

        s.stop();
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn stale_stream_urls_are_discarded() {
        let mut s = session();
        s.begin_loading(&track("aaaaaaaaaa")).unwrap();
        s.begin_loading(&track("bbbbbbbbbb")).unwrap();

        let started = s.attach_stream("aaaaaaaaaa", "https://example.com/a").unwrap();
        assert!(!started);
        assert_eq!(s.state(), SessionState::Loading);
        assert!(s.is_current("bbbbbbbbbb"));
    }

    #[test]
    fn end_of_track_during_a_new_load_is_ignored() {
        let mut s = session();
        let pcm = PcmBuffer::new();
        pcm.push_samples(&vec![0i16; 44_100 * 2]);
        s.attach_decoded(track("aaaaaaaaaa"), pcm);

        // The user moved on to another track; the old sink drains and
        // reports its end while the new one is still resolving.
        s.begin_loading(&track("bbbbbbbbbb")).unwrap();
        assert!(!s.finish_playback());
        assert_eq!(s.state(), SessionState::Loading);
        assert!(s.is_current("bbbbbbbbbb"));
    }

    #[test]
    fn end_of_track_releases_active_playback() {
        let mut s = session();
        let pcm = PcmBuffer::new();
        pcm.push_samples(&vec![0i16; 44_100 * 2]);
        s.attach_decoded(track("aaaaaaaaaa"), pcm);

        assert!(s.finish_playback());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.current_track().is_none());

        assert!(!s.finish_playback());
    }

    #[test]
    fn failed_resolution_parks_the_session_in_error() {
        let mut s = session();
        s.begin_loading(&track("cccccccccc")).unwrap();

        assert!(!s.fail_loading("dddddddddd"));
        assert_eq!(s.state(), SessionState::Loading);

        assert!(s.fail_loading("cccccccccc"));
        assert_eq!(s.state(), SessionState::Error);
        assert_eq!(s.position(), None);

        s.begin_loading(&track("eeeeeeeeee")).unwrap();
        assert_eq!(s.state(), SessionState::Loading);
    }

    #[test]
    fn seek_and_pause_flow_through_the_active_pipeline() {
        let mut s = session();
        s.toggle_pause();
        assert_eq!(s.state(), SessionState::Idle);

        let pcm = PcmBuffer::new();
        pcm.push_samples(&vec![0i16; 10 * 44_100 * 2]);
        s.attach_decoded(track("ffffffffff"), pcm);
        assert_eq!(s.state(), SessionState::Playing);
        assert_eq!(s.position(), Some(Duration::ZERO));

        assert_eq!(s.seek_by(-5), Some(Duration::ZERO));
        s.seek_by(5);
        s.seek_by(5);
        let end = s.seek_by(5).unwrap();
        assert!(end < Duration::from_secs(10));
        assert!(end > Duration::from_secs(9));

        s.toggle_pause();
        assert_eq!(s.state(), SessionState::Paused);
        s.toggle_pause();
        assert_eq!(s.state(), SessionState::Playing);
    }

    #[test]
    fn seek_is_ignored_while_loading() {
        let mut s = session();
        s.begin_loading(&track("gggggggggg")).unwrap();
        assert_eq!(s.seek_by(5), None);
    }
}
