use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

fn default_narrations_dir() -> PathBuf {
    PathBuf::from("data/narrations")
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".into()
}

fn default_ffprobe_bin() -> String {
    "ffprobe".into()
}

fn default_rsvg_convert_bin() -> String {
    "rsvg-convert".into()
}

/// Toolchain paths and credentials. Loaded from an optional JSON file, with
/// credentials overridable from the environment so they stay out of files
/// that get committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_narrations_dir")]
    pub narrations_dir: PathBuf,
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,
    #[serde(default = "default_ffprobe_bin")]
    pub ffprobe_bin: String,
    #[serde(default = "default_rsvg_convert_bin")]
    pub rsvg_convert_bin: String,
    #[serde(default)]
    pub elevenlabs_api_key: Option<String>,
    #[serde(default)]
    pub youtube_access_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            narrations_dir: default_narrations_dir(),
            ffmpeg_bin: default_ffmpeg_bin(),
            ffprobe_bin: default_ffprobe_bin(),
            rsvg_convert_bin: default_rsvg_convert_bin(),
            elevenlabs_api_key: None,
            youtube_access_token: None,
        }
    }
}

impl Config {
    /// Load from `path` if it exists, otherwise start from defaults, then
    /// apply environment overrides.
    pub fn load(path: &Path) -> Result<Config> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Config::default()
        };

        if let Ok(key) = env::var("ELEVENLABS_API_KEY") {
            config.elevenlabs_api_key = Some(key);
        }
        if let Ok(token) = env::var("YOUTUBE_ACCESS_TOKEN") {
            config.youtube_access_token = Some(token);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.ffmpeg_bin, "ffmpeg");
        assert_eq!(config.narrations_dir, PathBuf::from("data/narrations"));
    }

    #[test]
    fn partial_file_keeps_defaults_for_omitted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"ffmpeg_bin": "/opt/ffmpeg/bin/ffmpeg"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.ffmpeg_bin, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.ffprobe_bin, "ffprobe");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
