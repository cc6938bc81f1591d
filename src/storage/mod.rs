//! Sqlite-backed caches: resolved stream URLs (short TTL, the URLs expire
//! server-side anyway) and fetched lyric sheets keyed by track id.

use anyhow::Context;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Resolved stream URLs go stale on the CDN side after a few hours.
pub const STREAM_URL_TTL_SECS: i64 = 6 * 3600;

pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS stream_cache (
  video_id TEXT PRIMARY KEY,
  url TEXT NOT NULL,
  expires_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS lyrics_cache (
  video_id TEXT PRIMARY KEY,
  lrc_content TEXT,
  synced INTEGER DEFAULT 0,
  fetched_at INTEGER NOT NULL
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    pub fn get_stream_url(&self, video_id: &str, now_unix: i64) -> anyhow::Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, expires_at FROM stream_cache WHERE video_id=?1")
            .context("prepare stream cache")?;
        let mut rows = stmt.query(params![video_id]).context("query stream cache")?;
        if let Some(row) = rows.next().context("read stream cache row")? {
            let url: String = row.get(0)?;
            let exp: i64 = row.get(1)?;
            if exp > now_unix {
                Ok(Some(url))
            } else {
                Ok(None)
            }
        } else {
            Ok(None)
        }
    }

    pub fn cache_stream_url(
        &self,
        video_id: &str,
        url: &str,
        expires_at: i64,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO stream_cache(video_id, url, expires_at, updated_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(video_id) DO UPDATE SET
  url=excluded.url,
  expires_at=excluded.expires_at,
  updated_at=excluded.updated_at
"#,
                params![video_id, url, expires_at, now_unix],
            )
            .context("cache stream url")?;
        Ok(())
    }

    pub fn cache_lyrics(
        &self,
        video_id: &str,
        lrc_content: &str,
        synced: bool,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO lyrics_cache(video_id, lrc_content, synced, fetched_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(video_id) DO UPDATE SET
  lrc_content=excluded.lrc_content,
  synced=excluded.synced,
  fetched_at=excluded.fetched_at
"#,
                params![video_id, lrc_content, synced as i32, now_unix],
            )
            .context("cache lyrics")?;
        Ok(())
    }

    pub fn get_lyrics(&self, video_id: &str) -> anyhow::Result<Option<(String, bool)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT lrc_content, synced FROM lyrics_cache WHERE video_id=?1")?;
        let mut rows = stmt.query(params![video_id])?;
        if let Some(row) = rows.next()? {
            let content: String = row.get(0)?;
            let synced: i32 = row.get(1)?;
            Ok(Some((content, synced != 0)))
        } else {
            Ok(None)
        }
    }
}

// Simple way to use rusqlite from async tasks: open per operation inside
// spawn_blocking. Cheap at this call rate, and nothing to poison.
#[derive(Clone)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> anyhow::Result<Storage> {
        Storage::open(&self.path)
    }

    pub fn get_stream_url(&self, video_id: &str, now_unix: i64) -> anyhow::Result<Option<String>> {
        self.open()?.get_stream_url(video_id, now_unix)
    }

    pub fn cache_stream_url(
        &self,
        video_id: &str,
        url: &str,
        expires_at: i64,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.open()?.cache_stream_url(video_id, url, expires_at, now_unix)
    }

    pub fn cache_lyrics(
        &self,
        video_id: &str,
        lrc_content: &str,
        synced: bool,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.open()?.cache_lyrics(video_id, lrc_content, synced, now_unix)
    }

    pub fn get_lyrics(&self, video_id: &str) -> anyhow::Result<Option<(String, bool)>> {
        self.open()?.get_lyrics(video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("cache.sqlite3")).unwrap();
        (dir, storage)
    }

    #[test]
    fn stream_urls_round_trip_until_expiry() {
        let (_dir, storage) = temp_storage();
        let now = 1_000_000;
        storage
            .cache_stream_url("aaaaaaaaaa", "https://cdn.example/a", now + 600, now)
            .unwrap();

        let hit = storage.get_stream_url("aaaaaaaaaa", now + 599).unwrap();
        assert_eq!(hit.as_deref(), Some("https://cdn.example/a"));

        let expired = storage.get_stream_url("aaaaaaaaaa", now + 600).unwrap();
        assert_eq!(expired, None);

        let miss = storage.get_stream_url("bbbbbbbbbb", now).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn newer_stream_url_replaces_older() {
        let (_dir, storage) = temp_storage();
        storage
            .cache_stream_url("aaaaaaaaaa", "https://cdn.example/old", 2000, 1000)
            .unwrap();
        storage
            .cache_stream_url("aaaaaaaaaa", "https://cdn.example/new", 3000, 1500)
            .unwrap();

        let hit = storage.get_stream_url("aaaaaaaaaa", 1600).unwrap();
        assert_eq!(hit.as_deref(), Some("https://cdn.example/new"));
    }

    #[test]
    fn lyrics_round_trip_with_synced_flag() {
        let (_dir, storage) = temp_storage();
        storage
            .cache_lyrics("cccccccccc", "[00:01.00]hello", true, 1000)
            .unwrap();

        let (content, synced) = storage.get_lyrics("cccccccccc").unwrap().unwrap();
        assert_eq!(content, "[00:01.00]hello");
        assert!(synced);

        assert!(storage.get_lyrics("dddddddddd").unwrap().is_none());
    }

    #[test]
    fn handle_opens_per_operation() {
        let dir = tempfile::tempdir().unwrap();
        let handle = StorageHandle::new(dir.path().join("cache.sqlite3"));
        handle.cache_lyrics("eeeeeeeeee", "words", false, 1).unwrap();
        let (content, synced) = handle.get_lyrics("eeeeeeeeee").unwrap().unwrap();
        assert_eq!(content, "words");
        assert!(!synced);
    }
}
