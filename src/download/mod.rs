//! Track and album persistence: stream the resolved audio URL to a temp
//! file with progress, then encode a tagged MP3 (ID3v2, embedded cover)
//! with ffmpeg. Album downloads iterate a resolved track list into one
//! directory, skipping tracks that fail rather than aborting the rest.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::catalog::models::Track;
use crate::player::resolve::resolve_stream_url;

const MAX_FILE_NAME_LEN: usize = 120;

/// Replace path separators and reserved punctuation so a display title is
/// safe as a file or directory name on any filesystem.
pub fn sanitize_file_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
            c if c.is_control() => out.push('_'),
            c => out.push(c),
        }
    }
    let mut name = out
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string();
    if name.len() > MAX_FILE_NAME_LEN {
        let mut cut = MAX_FILE_NAME_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
        name = name.trim_end().to_string();
    }
    if name.is_empty() {
        name = "untitled".to_string();
    }
    name
}

/// Directory name for an album download. Trailing parenthesized decorations
/// and channel suffixes come off the album part; both halves are sanitized
/// together.
pub fn album_dir_name(artist: &str, album_title: &str) -> String {
    let mut album = match album_title.split_once('(') {
        Some((head, _)) => head.trim(),
        None => album_title.trim(),
    };
    for suffix in [" - Topic", "Topic"] {
        album = album.strip_suffix(suffix).unwrap_or(album).trim_end();
    }
    sanitize_file_name(&format!("{} - {}", artist.trim(), album))
}

/// Everything the encoder stamps into one output file.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input_audio: PathBuf,
    pub cover: Option<PathBuf>,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// (number, of) rendered as `track=N/M`.
    pub track_number: Option<(u32, u32)>,
    pub quality: u8,
    pub output: PathBuf,
}

/// ffmpeg argument list for [`EncodeJob`]. Pure so tag layout is testable.
pub fn encode_args(job: &EncodeJob) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        job.input_audio.display().to_string(),
    ];
    match &job.cover {
        Some(cover) => args.extend([
            "-i".into(),
            cover.display().to_string(),
            "-map".into(),
            "0:0".into(),
            "-map".into(),
            "1:0".into(),
        ]),
        None => args.extend(["-map".into(), "0:0".into()]),
    }
    args.extend([
        "-c:a".into(),
        "libmp3lame".into(),
        "-q:a".into(),
        job.quality.to_string(),
        "-id3v2_version".into(),
        "3".into(),
    ]);
    if job.cover.is_some() {
        args.extend([
            "-metadata:s:v".into(),
            "title=Album cover".into(),
            "-metadata:s:v".into(),
            "comment=Cover (Front)".into(),
        ]);
    }
    args.extend([
        "-metadata".into(),
        format!("title={}", job.title),
        "-metadata".into(),
        format!("artist={}", job.artist),
    ]);
    if let Some(album) = &job.album {
        args.push("-metadata".into());
        args.push(format!("album={album}"));
    }
    if let Some((number, of)) = job.track_number {
        args.push("-metadata".into());
        args.push(format!("track={number}/{of}"));
    }
    args.push(job.output.display().to_string());
    args
}

async fn encode(job: &EncodeJob) -> anyhow::Result<()> {
    let status = Command::new("ffmpeg")
        .args(encode_args(job))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .context("run ffmpeg encoder")?;
    if !status.success() {
        bail!("ffmpeg encode failed with {status}");
    }
    Ok(())
}

/// Stream `url` into `dest`, reporting a 0..=1 fraction when the response
/// carries a length. Returns bytes written.
pub async fn stream_to_file(
    http: &reqwest::Client,
    url: &str,
    dest: &Path,
    mut on_progress: impl FnMut(f64),
) -> anyhow::Result<u64> {
    let mut resp = http
        .get(url)
        .send()
        .await
        .context("request audio stream")?
        .error_for_status()
        .context("audio stream status")?;
    let total = resp.content_length().filter(|n| *n > 0);

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("create {}", dest.display()))?;
    let mut written: u64 = 0;
    while let Some(chunk) = resp.chunk().await.context("read audio stream")? {
        file.write_all(&chunk).await.context("write audio chunk")?;
        written += chunk.len() as u64;
        if let Some(total) = total {
            on_progress(written as f64 / total as f64);
        }
    }
    file.flush().await.context("flush audio file")?;
    Ok(written)
}

#[derive(Debug, Clone)]
pub struct TrackJob {
    pub track: Track,
    pub stream_url: String,
    pub album: Option<String>,
    pub track_number: Option<(u32, u32)>,
    pub cover: Option<PathBuf>,
    pub dest: PathBuf,
    pub quality: u8,
}

/// Download one resolved track as a tagged MP3 at `job.dest`.
///
/// Progress follows the byte stream; the final encode step reports 1.0
/// when the output file exists.
pub async fn download_track(
    http: &reqwest::Client,
    job: &TrackJob,
    tmp_dir: &Path,
    mut on_progress: impl FnMut(f64),
) -> anyhow::Result<PathBuf> {
    if !job.track.has_playable_id() {
        bail!(
            "cannot download this track: invalid track id {:?}",
            job.track.video_id
        );
    }
    tokio::fs::create_dir_all(tmp_dir)
        .await
        .with_context(|| format!("create dir {}", tmp_dir.display()))?;
    if let Some(parent) = job.dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create dir {}", parent.display()))?;
    }

    let temp_audio = tmp_dir.join(format!("encore-dl-{}.audio", job.track.video_id));
    stream_to_file(http, &job.stream_url, &temp_audio, &mut on_progress).await?;

    let result = encode(&EncodeJob {
        input_audio: temp_audio.clone(),
        cover: job.cover.clone(),
        title: job.track.title.clone(),
        artist: job.track.artist_line(),
        album: job.album.clone(),
        track_number: job.track_number,
        quality: job.quality,
        output: job.dest.clone(),
    })
    .await;
    let _ = tokio::fs::remove_file(&temp_audio).await;
    result?;
    on_progress(1.0);
    Ok(job.dest.clone())
}

#[derive(Debug, Clone)]
pub struct AlbumJob {
    pub tracks: Vec<Track>,
    pub album_title: String,
    pub artist: String,
    pub dest_root: PathBuf,
    pub tmp_dir: PathBuf,
    pub cover: Option<PathBuf>,
    pub quality: u8,
}

#[derive(Debug, Clone)]
pub struct AlbumOutcome {
    pub dir: PathBuf,
    pub done: usize,
    pub total: usize,
}

/// Album-wide fraction. Counts finished tracks, not list positions, so
/// skipped tracks do not inflate the progress.
fn album_fraction(done: usize, current: f64, total: usize) -> f64 {
    (done as f64 + current) / total as f64
}

/// Download a resolved album into `<dest_root>/<artist - album>/` with
/// `NN - Title.mp3` naming. Tracks that cannot be resolved or encoded are
/// skipped. Overall progress is `(done + current_fraction) / total`.
pub async fn download_album(
    http: &reqwest::Client,
    job: &AlbumJob,
    mut on_progress: impl FnMut(f64, &str),
) -> anyhow::Result<AlbumOutcome> {
    if job.tracks.is_empty() {
        bail!("no tracks found in album");
    }
    let dir = job
        .dest_root
        .join(album_dir_name(&job.artist, &job.album_title));
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("create dir {}", dir.display()))?;

    let total = job.tracks.len();
    let mut done = 0usize;
    for (i, track) in job.tracks.iter().enumerate() {
        if !track.has_playable_id() {
            debug!(video_id = %track.video_id, "skipping track without playable id");
            continue;
        }
        on_progress(album_fraction(done, 0.0, total), &track.title);

        let url = match resolve_stream_url(&track.video_id).await {
            Ok(url) => url,
            Err(err) => {
                warn!("could not resolve {:?}: {err:#}", track.title);
                continue;
            }
        };
        let number = (i + 1) as u32;
        let dest = dir.join(format!(
            "{number:02} - {}.mp3",
            sanitize_file_name(&track.title)
        ));
        let track_job = TrackJob {
            track: track.clone(),
            stream_url: url,
            album: Some(job.album_title.clone()),
            track_number: Some((number, total as u32)),
            cover: job.cover.clone(),
            dest,
            quality: job.quality,
        };
        let finished = done;
        let progress = |f: f64| on_progress(album_fraction(finished, f, total), &track.title);
        match download_track(http, &track_job, &job.tmp_dir, progress).await {
            Ok(path) => {
                debug!("saved {}", path.display());
                done += 1;
            }
            Err(err) => warn!("skipping {:?}: {err:#}", track.title),
        }
    }

    Ok(AlbumOutcome { dir, done, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn album_progress_counts_finished_tracks_only() {
        // Third track of five, first two skipped and one finished: the
        // fraction reflects the single finished track, not the index.
        assert_eq!(album_fraction(1, 0.0, 5), 0.2);
        assert_eq!(album_fraction(1, 0.5, 5), 0.3);
        assert_eq!(album_fraction(5, 0.0, 5), 1.0);
    }

    #[test]
    fn sanitize_replaces_reserved_punctuation() {
        assert_eq!(sanitize_file_name("AC/DC: Back?"), "AC_DC_ Back_");
        assert_eq!(sanitize_file_name("a\\b*c\"d<e>f|g"), "a_b_c_d_e_f_g");
    }

    #[test]
    fn sanitize_collapses_whitespace_and_caps_length() {
        assert_eq!(sanitize_file_name("  too   many\tspaces  "), "too many spaces");
        let long = "x".repeat(400);
        assert_eq!(sanitize_file_name(&long).len(), MAX_FILE_NAME_LEN);
        assert_eq!(sanitize_file_name("   "), "untitled");
        assert_eq!(sanitize_file_name("..."), "untitled");
    }

    #[test]
    fn album_dirs_drop_parenthesized_decorations() {
        assert_eq!(
            album_dir_name("Example Band", "Greatest Hits (Remastered 2011)"),
            "Example Band - Greatest Hits"
        );
        assert_eq!(
            album_dir_name("Some Artist", "Plain Album"),
            "Some Artist - Plain Album"
        );
    }

    #[test]
    fn encode_args_without_cover_map_single_stream() {
        let args = encode_args(&EncodeJob {
            input_audio: PathBuf::from("/tmp/in.audio"),
            cover: None,
            title: "Song".into(),
            artist: "Band".into(),
            album: None,
            track_number: None,
            quality: 2,
            output: PathBuf::from("/out/Song.mp3"),
        });
        let joined = args.join(" ");
        assert!(joined.contains("-map 0:0"));
        assert!(!joined.contains("1:0"));
        assert!(joined.contains("-c:a libmp3lame -q:a 2 -id3v2_version 3"));
        assert!(joined.contains("-metadata title=Song"));
        assert!(!joined.contains("album="));
        assert!(joined.ends_with("/out/Song.mp3"));
    }

    #[test]
    fn encode_args_with_cover_embed_front_picture_and_track_number() {
        let args = encode_args(&EncodeJob {
            input_audio: PathBuf::from("/tmp/in.audio"),
            cover: Some(PathBuf::from("/tmp/cover.jpg")),
            title: "Song".into(),
            artist: "Band".into(),
            album: Some("Greatest Hits".into()),
            track_number: Some((3, 12)),
            quality: 0,
            output: PathBuf::from("/out/03 - Song.mp3"),
        });
        let joined = args.join(" ");
        assert!(joined.contains("-i /tmp/cover.jpg -map 0:0 -map 1:0"));
        assert!(joined.contains("-metadata:s:v title=Album cover"));
        assert!(joined.contains("-metadata album=Greatest Hits"));
        assert!(joined.contains("-metadata track=3/12"));
        assert!(joined.contains("-q:a 0"));
    }
}
