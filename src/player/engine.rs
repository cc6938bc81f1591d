//! Audio output thread.
//!
//! The output stream is not `Send`, so it lives on a dedicated OS thread
//! that owns the device for the lifetime of the app. The async side talks
//! to it through a command channel; the thread reports back over the main
//! event channel.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::anyhow;
use rodio::{OutputStreamBuilder, Sink};
use tracing::{debug, error};

use super::pcm::{PcmBuffer, PcmSource};
use crate::app::events::{Event, PlayerEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug)]
enum EngineCmd {
    Play(PcmBuffer),
    SetPaused(bool),
    Stop,
    SetVolume(f32),
    Quit,
}

/// Handle to the output thread.
pub struct AudioEngine {
    tx: Sender<EngineCmd>,
    join: Option<JoinHandle<()>>,
}

impl AudioEngine {
    /// Spawn the output thread. If no device can be opened the thread
    /// reports a player error and exits; later `play` calls then fail.
    pub fn start(events: tokio::sync::mpsc::Sender<Event>, volume: f32) -> Self {
        let (tx, rx) = mpsc::channel();
        let join = thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || run_output(rx, events, volume))
            .ok();
        Self { tx, join }
    }

    /// Start playing a buffer, replacing whatever was playing before.
    pub fn play(&self, buffer: PcmBuffer) -> anyhow::Result<()> {
        self.tx
            .send(EngineCmd::Play(buffer))
            .map_err(|_| anyhow!("audio output is not running"))
    }

    pub fn set_paused(&self, paused: bool) {
        let _ = self.tx.send(EngineCmd::SetPaused(paused));
    }

    pub fn stop(&self) {
        let _ = self.tx.send(EngineCmd::Stop);
    }

    pub fn set_volume(&self, volume: f32) {
        let _ = self.tx.send(EngineCmd::SetVolume(volume));
    }

    /// Stop the thread and wait for it to exit.
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(EngineCmd::Quit);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    /// Handle whose output thread never existed. Commands go nowhere and
    /// `play` fails, which is exactly what session tests need.
    #[cfg(test)]
    pub(crate) fn disconnected() -> Self {
        let (tx, _) = mpsc::channel();
        Self { tx, join: None }
    }
}

fn run_output(rx: Receiver<EngineCmd>, events: tokio::sync::mpsc::Sender<Event>, volume: f32) {
    let mut stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(err) => {
            error!("could not open audio output: {err:#}");
            let _ = events.blocking_send(Event::Player(PlayerEvent::Error(format!(
                "no audio output device: {err}"
            ))));
            return;
        }
    };
    stream.log_on_drop(false);

    let mut sink: Option<Sink> = None;
    let mut volume = volume;
    let mut paused = false;
    let mut active = false;

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(EngineCmd::Play(buffer)) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                let new = Sink::connect_new(stream.mixer());
                new.set_volume(volume);
                new.append(PcmSource::new(buffer));
                new.play();
                sink = Some(new);
                paused = false;
                active = true;
            }
            Ok(EngineCmd::SetPaused(value)) => {
                if let Some(sink) = &sink {
                    if value {
                        sink.pause();
                    } else {
                        sink.play();
                    }
                }
                paused = value;
            }
            Ok(EngineCmd::Stop) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                active = false;
                paused = false;
            }
            Ok(EngineCmd::SetVolume(value)) => {
                volume = value.clamp(0.0, 2.0);
                if let Some(sink) = &sink {
                    sink.set_volume(volume);
                }
            }
            Ok(EngineCmd::Quit) => break,
            Err(RecvTimeoutError::Timeout) => {
                // A drained sink with nothing queued means the track ended.
                let ended = active && !paused && sink.as_ref().is_some_and(|s| s.empty());
                if ended {
                    active = false;
                    sink = None;
                    debug!("playback drained, reporting end of track");
                    let _ = events.blocking_send(Event::Player(PlayerEvent::Ended));
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if let Some(sink) = sink.take() {
        sink.stop();
    }
}
