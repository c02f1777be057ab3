use anyhow::{Result, anyhow};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub mod catalog;
pub mod config;
pub mod error;
pub mod player;

pub use catalog::{Category, Video};
pub use config::PlayerConfig;
pub use error::PlaybackError;
pub use player::{LoadOptions, PlaybackState, PlayerHandle};

// Poll interval of engine worker threads
pub const REFRESH_RATE: Duration = Duration::from_millis(33);

pub const CONFIG_DIRECTORY: &str = "vidplay";
pub const CONFIG_FILE: &str = "config.toml";

pub enum DurationStyle {
    Clean,
    Compact,
}

pub fn get_readable_duration(duration: Duration, style: DurationStyle) -> String {
    let mut secs = duration.as_secs();
    let mins = secs / 60;
    secs %= 60;

    match style {
        DurationStyle::Clean => match mins {
            0 => format!("{secs:02}s"),
            _ => format!("{mins}m {secs:02}s"),
        },
        DurationStyle::Compact => format!("{mins}:{secs:02}"),
    }
}

pub fn expand_tilde<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.starts_with('~') {
        return Ok(path.to_path_buf());
    }

    if path_str.starts_with("~/") || path_str.starts_with("~\\") {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory!"))?;
        return Ok(home.join(&path_str[2..]));
    }

    Err(anyhow!("Error reading path with tilde (~): {path_str}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_duration_styles() {
        let d = Duration::from_secs(125);
        assert_eq!(get_readable_duration(d, DurationStyle::Compact), "2:05");
        assert_eq!(get_readable_duration(d, DurationStyle::Clean), "2m 05s");
        assert_eq!(
            get_readable_duration(Duration::from_secs(7), DurationStyle::Clean),
            "07s"
        );
    }

    #[test]
    fn tilde_passthrough_and_rejects_bare_user() {
        assert_eq!(
            expand_tilde("/tmp/media.json").unwrap(),
            PathBuf::from("/tmp/media.json")
        );
        assert!(expand_tilde("~other/media.json").is_err());
    }
}
