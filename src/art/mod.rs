//! Cover art fetch-to-cache. Thumbnails are small; they are fetched once
//! per track id and reused by the now-playing view and the downloader.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn cover_path(cache_dir: &Path, video_id: &str) -> PathBuf {
    cache_dir.join("covers").join(format!("{video_id}.jpg"))
}

/// Download `url` into the cover cache unless it is already there.
pub async fn fetch_cover(
    http: &reqwest::Client,
    url: &str,
    cache_dir: &Path,
    video_id: &str,
) -> anyhow::Result<PathBuf> {
    let path = cover_path(cache_dir, video_id);
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        debug!(video_id, "cover already cached");
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create dir {}", parent.display()))?;
    }

    let bytes = http
        .get(url)
        .send()
        .await
        .context("request cover")?
        .error_for_status()
        .context("cover status")?
        .bytes()
        .await
        .context("read cover body")?;
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_paths_are_keyed_by_track_id() {
        let path = cover_path(Path::new("/data"), "dQw4w9WgXcQ");
        assert_eq!(path, PathBuf::from("/data/covers/dQw4w9WgXcQ.jpg"));
    }
}
