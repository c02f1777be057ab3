use crate::{CONFIG_DIRECTORY, CONFIG_FILE, error::PlaybackError, player::MediaOptions};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

const OPENING_TIMEOUT_MS: u64 = 30_000;
const WATCHDOG_INTERVAL_MS: u64 = 3_000;
const SEEK_STEP_SECS: i64 = 10;
const THUMBNAIL_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub opening_timeout_ms: u64,
    pub watchdog_interval_ms: u64,
    pub seek_step_secs: i64,
    pub default_volume: u8,
    pub thumbnail_timeout_ms: u64,
    pub media: MediaOptions,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            opening_timeout_ms: OPENING_TIMEOUT_MS,
            watchdog_interval_ms: WATCHDOG_INTERVAL_MS,
            seek_step_secs: SEEK_STEP_SECS,
            default_volume: 100,
            thumbnail_timeout_ms: THUMBNAIL_TIMEOUT_MS,
            media: MediaOptions::default(),
        }
    }
}

impl PlayerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_str = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str::<PlayerConfig>(&file_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `<config_dir>/vidplay/config.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIRECTORY).join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.watchdog_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "watchdog_interval_ms must be greater than zero".into(),
            ));
        }
        if self.opening_timeout_ms < self.watchdog_interval_ms {
            return Err(PlaybackError::Config(format!(
                "opening_timeout_ms ({}) is shorter than watchdog_interval_ms ({})",
                self.opening_timeout_ms, self.watchdog_interval_ms
            )));
        }
        if self.seek_step_secs <= 0 {
            return Err(PlaybackError::Config(format!(
                "seek_step_secs must be greater than zero, got {}",
                self.seek_step_secs
            )));
        }
        if self.default_volume > 100 {
            return Err(PlaybackError::Config(format!(
                "default_volume must be within 0..=100, got {}",
                self.default_volume
            )));
        }
        Ok(())
    }

    pub fn opening_timeout(&self) -> Duration {
        Duration::from_millis(self.opening_timeout_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }

    pub fn thumbnail_timeout(&self) -> Duration {
        Duration::from_millis(self.thumbnail_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "opening_timeout_ms = 9000\n\n[media]\nnetwork_caching_ms = 1000"
        )
        .unwrap();

        let config = PlayerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.opening_timeout_ms, 9000);
        assert_eq!(config.watchdog_interval_ms, WATCHDOG_INTERVAL_MS);
        assert_eq!(config.media.network_caching_ms, 1000);
        assert_eq!(config.media.aspect_ratio, "16:9");
    }

    #[test]
    fn rejects_timeout_shorter_than_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "opening_timeout_ms = 100\nwatchdog_interval_ms = 3000").unwrap();

        assert!(PlayerConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "opening_timeout_ms = \"soon\"").unwrap();

        assert!(PlayerConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn rejects_non_positive_seek_step() {
        for step in [0, -10, i64::MIN] {
            let config = PlayerConfig {
                seek_step_secs: step,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(PlaybackError::Config(_))));
        }
    }

    #[test]
    fn defaults_validate() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.opening_timeout(), Duration::from_secs(30));
        assert_eq!(config.watchdog_interval(), Duration::from_secs(3));
    }
}
