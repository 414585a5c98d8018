use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod store;

pub use store::SettingsStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>, // defaults to ~/Videos
    pub container: String,
    pub capture: CaptureConfig,
    pub audio: AudioConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub ffmpeg_path: String,
    pub display: String, // x11grab input, e.g. ":0.0"
    pub video_codec: String,
    pub preset: String,
    pub loglevel: String,
    pub fallback_resolution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: String, // pulse, alsa
    pub device: String,
    pub channels: u16,
    pub codec: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub stop_timeout_ms: u64,
    pub authorize_display: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            container: "mp4".to_string(),
            capture: CaptureConfig::default(),
            audio: AudioConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            display: ":0.0".to_string(),
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            loglevel: "error".to_string(),
            fallback_resolution: "1920x1080".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: "pulse".to_string(),
            device: "default".to_string(),
            channels: 2,
            codec: "aac".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stop_timeout_ms: 3000,
            authorize_display: true,
        }
    }
}

impl Config {
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path()?)
    }

    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("settings.toml"))
    }

    /// Directory recordings are written to.
    pub fn resolved_output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_output_dir(),
        }
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "trayrecorder", "tray-recorder")
            .context("Failed to determine config directory")
    }
}

pub fn default_output_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("Failed to determine home directory")?;
    Ok(base.home_dir().join("Videos"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.container, "mp4");
        assert_eq!(config.capture.display, ":0.0");
        assert_eq!(config.audio.channels, 2);
        assert_eq!(config.session.stop_timeout_ms, 3000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("container = \"mkv\"\n[session]\nstop_timeout_ms = 500\n").unwrap();
        assert_eq!(config.container, "mkv");
        assert_eq!(config.session.stop_timeout_ms, 500);
        assert!(config.session.authorize_display);
        assert_eq!(config.capture.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create_at(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load_or_create_at(&path).unwrap();
        assert_eq!(created.container, loaded.container);
        assert_eq!(created.audio.device, loaded.audio.device);
        assert!(loaded.output_dir.is_none());
    }

    #[test]
    fn test_default_output_dir_is_videos() {
        let dir = default_output_dir().unwrap();
        assert!(dir.ends_with("Videos"));
    }
}
