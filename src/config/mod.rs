use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub resolver: ResolverConfig,
    pub player: PlayerConfig,
    pub downloads: DownloadsConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Cap on rows kept from one search call.
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Cap on artist-only matches accepted by the related-tracks fallback.
    pub fallback_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Volume level (0-100)
    pub volume: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Target directory; falls back to the platform music dir, then the
    /// data dir.
    pub dir: Option<PathBuf>,
    /// lame VBR quality passed to the encoder (0 best, 9 smallest).
    pub mp3_quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback_cap: crate::catalog::albums::DEFAULT_FALLBACK_CAP,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { volume: 80 }
    }
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            mp3_quality: 2,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "midnight".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "encore", "encore");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("encore"));
        Self { data_dir }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            resolver: ResolverConfig::default(),
            player: PlayerConfig::default(),
            downloads: DownloadsConfig::default(),
            ui: UiConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Config {
    /// Volume as the 0.0..=1.0 factor the audio engine takes.
    pub fn volume_factor(&self) -> f32 {
        f32::from(self.player.volume.min(100)) / 100.0
    }

    /// Where downloads land: configured dir, else the platform music dir,
    /// else `<data_dir>/downloads`.
    pub fn downloads_dir(&self) -> PathBuf {
        if let Some(dir) = &self.downloads.dir {
            return dir.clone();
        }
        if let Some(user) = directories::UserDirs::new()
            && let Some(audio) = user.audio_dir()
        {
            return audio.join("encore");
        }
        self.paths.data_dir.join("downloads")
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "encore", "encore").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        save(&cfg, Some(&path))?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg =
        toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("[player]\nvolume = 25\n").unwrap();
        assert_eq!(cfg.player.volume, 25);
        assert_eq!(cfg.resolver.fallback_cap, 10);
        assert_eq!(cfg.search.limit, 50);
        assert!((cfg.volume_factor() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn load_writes_defaults_once_and_rereads_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let created = load(Some(&path)).unwrap();
        assert!(path.exists());

        let reread = load(Some(&path)).unwrap();
        assert_eq!(reread.resolver.fallback_cap, created.resolver.fallback_cap);
        assert_eq!(reread.ui.theme, created.ui.theme);
    }

    #[test]
    fn explicit_downloads_dir_wins() {
        let mut cfg = Config::default();
        cfg.downloads.dir = Some(PathBuf::from("/tmp/music"));
        assert_eq!(cfg.downloads_dir(), PathBuf::from("/tmp/music"));
    }
}
