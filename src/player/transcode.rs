//! External transcoder that turns a stream URL into raw PCM.
//!
//! ffmpeg reads the remote stream (with reconnect flags, since googlevideo
//! URLs drop connections freely) and writes interleaved s16le frames to
//! stdout. A feeder task copies those frames into the shared [`PcmBuffer`].

use std::process::Stdio;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::pcm::{PcmBuffer, CHANNELS, SAMPLE_RATE};

/// Some CDNs throttle or cut connections without a browser user agent.
const STREAM_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Argument list for decoding `input_url` to PCM on stdout.
pub fn transcode_args(input_url: &str) -> Vec<String> {
    [
        "-user_agent",
        STREAM_USER_AGENT,
        "-reconnect",
        "1",
        "-reconnect_at_eof",
        "1",
        "-reconnect_streamed",
        "1",
        "-reconnect_delay_max",
        "5",
        "-probesize",
        "5000000",
        "-analyzeduration",
        "5000000",
        "-i",
        input_url,
        "-loglevel",
        "error",
        "-vn",
        "-f",
        "s16le",
        "-acodec",
        "pcm_s16le",
        "-ar",
        "44100",
        "-ac",
        "2",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Spawn ffmpeg and a feeder task that fills `buffer` from its stdout.
///
/// The feeder marks the buffer finished when the pipe closes, whether the
/// process ended cleanly or was killed. The returned child must be torn
/// down by the caller; it is also killed if dropped.
pub fn spawn(input_url: &str, buffer: PcmBuffer) -> anyhow::Result<(Child, JoinHandle<()>)> {
    let mut child = Command::new("ffmpeg")
        .args(transcode_args(input_url))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .context("failed to spawn ffmpeg, is it installed?")?;

    let stdout = child
        .stdout
        .take()
        .context("transcoder stdout was not piped")?;
    let feeder = tokio::spawn(feed_buffer(stdout, buffer));
    Ok((child, feeder))
}

async fn feed_buffer(mut stdout: tokio::process::ChildStdout, buffer: PcmBuffer) {
    // One second of audio per read keeps lock traffic low.
    let mut raw = vec![0u8; SAMPLE_RATE as usize * CHANNELS as usize * 2];
    let mut carry: Option<u8> = None;
    loop {
        match stdout.read(&mut raw).await {
            Ok(0) => break,
            Ok(n) => {
                let mut bytes = &raw[..n];
                let mut samples = Vec::with_capacity(n / 2 + 1);
                if let Some(low) = carry.take() {
                    samples.push(i16::from_le_bytes([low, bytes[0]]));
                    bytes = &bytes[1..];
                }
                let mut pairs = bytes.chunks_exact(2);
                for pair in &mut pairs {
                    samples.push(i16::from_le_bytes([pair[0], pair[1]]));
                }
                carry = pairs.remainder().first().copied();
                buffer.push_samples(&samples);
            }
            Err(err) => {
                warn!("transcoder read failed: {err:#}");
                break;
            }
        }
    }
    buffer.finish();
    debug!("transcoder stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_decode_to_interleaved_pcm() {
        let args = transcode_args("https://example.com/stream");
        let joined = args.join(" ");
        assert!(joined.contains("-i https://example.com/stream"));
        assert!(joined.contains("-f s16le"));
        assert!(joined.contains("-ar 44100"));
        assert!(joined.contains("-ac 2"));
        assert!(joined.ends_with("pipe:1"));
    }

    #[test]
    fn args_keep_reconnect_flags_before_input() {
        let args = transcode_args("url");
        let input = args.iter().position(|a| a == "-i").unwrap();
        let reconnect = args.iter().position(|a| a == "-reconnect").unwrap();
        assert!(reconnect < input);
    }
}
