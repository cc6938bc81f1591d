//! Streaming playback: stream resolution, the transcoder pipeline, the
//! shared PCM buffer, the output thread, and the session state machine
//! that ties them together.

pub mod engine;
pub mod pcm;
pub mod resolve;
pub mod session;
pub mod transcode;

pub use engine::AudioEngine;
pub use session::{PlaybackSession, SessionError, SessionState};
