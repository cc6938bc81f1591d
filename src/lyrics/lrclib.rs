//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use serde::Deserialize;

/// One lyric service candidate
#[derive(Debug, Deserialize, Clone)]
pub struct LyricEntry {
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

impl LyricEntry {
    pub fn has_synced(&self) -> bool {
        self.synced_lyrics.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn has_plain(&self) -> bool {
        self.plain_lyrics.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";
    const USER_AGENT: &'static str = "encore/0.1.0 (terminal music player)";

    /// Create a new LRCLIB client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(Self::USER_AGENT)
                .timeout(std::time::Duration::from_secs(7))
                .build()
                .expect("failed to create reqwest client"),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Free-text search returning every candidate the service offers.
    /// Callers pick the first with time-tagged text.
    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<LyricEntry>> {
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(query));

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            anyhow::bail!("LRCLIB search error: {}", response.status());
        }

        let results: Vec<LyricEntry> = response.json().await?;
        Ok(results)
    }

    /// Exact lookup by artist and title; at most one candidate.
    pub async fn get_exact(
        &self,
        track_name: &str,
        artist_name: &str,
        duration_secs: Option<u32>,
    ) -> anyhow::Result<Option<LyricEntry>> {
        let mut url = format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name)
        );

        if let Some(duration) = duration_secs {
            url.push_str(&format!("&duration={}", duration));
        }

        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            let entry: LyricEntry = response.json().await?;
            Ok(Some(entry))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }
}

impl Default for LrclibClient {
    fn default() -> Self {
        Self::new()
    }
}
