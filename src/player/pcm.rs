//! Shared PCM buffer between the transcoder feeder and the audio output.
//!
//! The transcoder writes decoded frames in from one side while the output
//! device pulls them out the other. Keeping the play cursor in the same
//! lock as the sample store is what makes seeking exact: a seek is just a
//! cursor move, clamped to whatever has been decoded so far.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Output format the transcoder is asked for. Frame math everywhere in the
/// player assumes these two numbers.
pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNELS: u16 = 2;

/// Samples handed to the output per buffer lock.
const FRAMES_PER_PULL: usize = 1024;

#[derive(Debug, Default)]
struct PcmState {
    /// Interleaved samples, `CHANNELS` per frame.
    samples: Vec<i16>,
    /// Next frame the output will play.
    cursor: usize,
    /// Set once the feeder has written everything it will ever write.
    finished: bool,
}

impl PcmState {
    fn frames_available(&self) -> usize {
        self.samples.len() / CHANNELS as usize
    }
}

/// Cheaply clonable handle to one track's decoded audio.
#[derive(Debug, Clone, Default)]
pub struct PcmBuffer {
    state: Arc<Mutex<PcmState>>,
}

impl PcmBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded samples. Called by the feeder task only.
    pub fn push_samples(&self, samples: &[i16]) {
        let mut state = self.state.lock().unwrap();
        state.samples.extend_from_slice(samples);
    }

    /// Mark the stream complete. After this the output drains what is left
    /// and then reports end-of-source instead of stalling on silence.
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().unwrap().finished
    }

    /// Elapsed playback time, derived from the frame cursor.
    pub fn position(&self) -> Duration {
        let state = self.state.lock().unwrap();
        frames_to_duration(state.cursor)
    }

    /// Total decoded audio so far.
    pub fn buffered(&self) -> Duration {
        let state = self.state.lock().unwrap();
        frames_to_duration(state.frames_available())
    }

    /// Move the cursor by `delta_secs`, clamping to the decoded range.
    ///
    /// A backward seek near the start lands on frame zero; a forward seek
    /// past the end lands on the last decoded frame. While the transcoder
    /// is still running "the end" is the decode frontier, which only ever
    /// grows, so a clamped forward seek never jumps backwards later.
    pub fn seek_by(&self, delta_secs: i64) -> Duration {
        let mut state = self.state.lock().unwrap();
        let delta_frames = delta_secs.saturating_mul(SAMPLE_RATE as i64);
        let target = state.cursor as i64 + delta_frames;
        let last = state.frames_available().saturating_sub(1);
        state.cursor = target.clamp(0, last as i64) as usize;
        frames_to_duration(state.cursor)
    }

    /// Pull up to [`FRAMES_PER_PULL`] frames from the cursor, advancing it.
    ///
    /// Returns `None` when the stream is finished and fully drained. An
    /// empty vec means underrun: the feeder has not caught up yet, so the
    /// caller should emit silence without the cursor moving.
    fn pull_chunk(&self) -> Option<Vec<i16>> {
        let mut state = self.state.lock().unwrap();
        let available = state.frames_available();
        if state.cursor >= available {
            return if state.finished { None } else { Some(Vec::new()) };
        }
        let frames = (available - state.cursor).min(FRAMES_PER_PULL);
        let start = state.cursor * CHANNELS as usize;
        let end = (state.cursor + frames) * CHANNELS as usize;
        let chunk = state.samples[start..end].to_vec();
        state.cursor += frames;
        Some(chunk)
    }
}

fn frames_to_duration(frames: usize) -> Duration {
    Duration::from_micros(frames as u64 * 1_000_000 / SAMPLE_RATE as u64)
}

/// Adapter that lets the output sink play a [`PcmBuffer`].
///
/// Underruns yield silence so the sink never starves mid-track; the source
/// only ends once the feeder has finished and every frame was consumed.
pub struct PcmSource {
    buffer: PcmBuffer,
    chunk: std::vec::IntoIter<i16>,
    silence_left: usize,
}

impl PcmSource {
    pub fn new(buffer: PcmBuffer) -> Self {
        Self {
            buffer,
            chunk: Vec::new().into_iter(),
            silence_left: 0,
        }
    }
}

impl Iterator for PcmSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.silence_left > 0 {
            self.silence_left -= 1;
            return Some(0.0);
        }
        if let Some(sample) = self.chunk.next() {
            return Some(sample as f32 / 32_768.0);
        }
        match self.buffer.pull_chunk() {
            None => None,
            Some(chunk) if chunk.is_empty() => {
                self.silence_left = FRAMES_PER_PULL * CHANNELS as usize - 1;
                Some(0.0)
            }
            Some(chunk) => {
                self.chunk = chunk.into_iter();
                self.next()
            }
        }
    }
}

impl rodio::Source for PcmSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with_seconds(secs: usize) -> PcmBuffer {
        let buffer = PcmBuffer::new();
        let frames = secs * SAMPLE_RATE as usize;
        buffer.push_samples(&vec![100i16; frames * CHANNELS as usize]);
        buffer
    }

    #[test]
    fn backward_seek_clamps_to_start() {
        let buffer = buffer_with_seconds(10);
        assert_eq!(buffer.seek_by(-5), Duration::ZERO);
        buffer.seek_by(3);
        assert_eq!(buffer.seek_by(-5), Duration::ZERO);
    }

    #[test]
    fn forward_seek_clamps_to_last_decoded_frame() {
        let buffer = buffer_with_seconds(6);
        assert_eq!(buffer.seek_by(5), Duration::from_secs(5));
        let clamped = buffer.seek_by(5);
        let last_frame = frames_to_duration(6 * SAMPLE_RATE as usize - 1);
        assert_eq!(clamped, last_frame);
        assert!(clamped < Duration::from_secs(6));
    }

    #[test]
    fn forward_seek_frontier_grows_with_the_feeder() {
        let buffer = buffer_with_seconds(2);
        buffer.seek_by(30);
        let early = buffer.position();
        assert!(early < Duration::from_secs(2));

        buffer.push_samples(&vec![0i16; 8 * SAMPLE_RATE as usize * CHANNELS as usize]);
        let later = buffer.seek_by(30);
        assert!(later > early);
    }

    #[test]
    fn position_tracks_pulled_frames() {
        let buffer = buffer_with_seconds(1);
        assert_eq!(buffer.position(), Duration::ZERO);
        buffer.pull_chunk();
        assert_eq!(buffer.position(), frames_to_duration(FRAMES_PER_PULL));
    }

    #[test]
    fn underrun_yields_silence_without_advancing() {
        let buffer = PcmBuffer::new();
        buffer.push_samples(&[5; 4]);
        let mut source = PcmSource::new(buffer.clone());
        for _ in 0..4 {
            let sample = source.next().unwrap();
            assert!(sample > 0.0);
        }
        let pos_before = buffer.position();
        assert_eq!(source.next(), Some(0.0));
        assert_eq!(buffer.position(), pos_before);
    }

    #[test]
    fn source_ends_after_finish_and_drain() {
        let buffer = PcmBuffer::new();
        buffer.push_samples(&[16_384, -16_384]);
        buffer.finish();
        let mut source = PcmSource::new(buffer);
        assert_eq!(source.next(), Some(0.5));
        assert_eq!(source.next(), Some(-0.5));
        assert_eq!(source.next(), None);
    }

    #[test]
    fn seek_on_empty_buffer_stays_at_zero() {
        let buffer = PcmBuffer::new();
        assert_eq!(buffer.seek_by(5), Duration::ZERO);
        assert_eq!(buffer.seek_by(-5), Duration::ZERO);
    }
}
