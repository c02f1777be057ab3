mod video;

pub use video::Video;

use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::path::Path;

use crate::expand_tilde;

pub const BASE_MEDIA_URL: &str = "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/";

static BUNDLED_CATALOG: &str = include_str!("../../assets/media.json");

/// Static list of playable items. The player core never reads this; it only
/// receives the locators picked from it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Category {
    pub name: String,
    pub videos: Vec<Video>,
}

impl Category {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_tilde(path)?;
        let file_str = std::fs::read_to_string(&path)
            .map_err(|e| anyhow!("Could not read catalog {}: {e}", path.display()))?;
        Self::from_json(&file_str)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut category = serde_json::from_str::<Category>(json)?;
        category.videos.iter_mut().for_each(Video::assign_id);
        Ok(category)
    }

    pub fn find(&self, id: u64) -> Option<&Video> {
        self.videos.iter().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}
