use anyhow::Context;
use tokio::process::Command;

/// Resolve a direct audio stream URL for a track via yt-dlp.
pub async fn resolve_stream_url(video_id: &str) -> anyhow::Result<String> {
    let mut cmd = Command::new("yt-dlp");
    cmd.args(["-f", "bestaudio", "--get-url", "--no-playlist"]);
    cmd.arg(format!("https://music.youtube.com/watch?v={video_id}"));

    let out = cmd.output().await.context("run yt-dlp")?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        anyhow::bail!("yt-dlp failed: {}", stderr.trim());
    }

    let stdout = String::from_utf8(out.stdout).context("decode yt-dlp stdout")?;
    let url = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .context("yt-dlp returned empty url")?;
    Ok(url.to_string())
}
