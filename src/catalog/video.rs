use serde::Deserialize;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    #[serde(skip)]
    pub id: u64,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub sources: Vec<String>,
    pub thumb: String,
}

impl Video {
    /// Id derived from title and sources, so it survives reloads of the
    /// same catalog file.
    pub(super) fn assign_id(&mut self) {
        let mut data = Vec::with_capacity(self.title.len() + 64);
        data.extend_from_slice(self.title.as_bytes());
        for source in &self.sources {
            data.push(0);
            data.extend_from_slice(source.as_bytes());
        }
        self.id = xxh3_64(&data);
    }

    pub fn primary_source(&self) -> Option<&str> {
        self.sources.first().map(String::as_str)
    }

    pub fn thumb_url(&self, base: &str) -> String {
        match base.ends_with('/') || self.thumb.starts_with('/') {
            true => format!("{base}{}", self.thumb),
            false => format!("{base}/{}", self.thumb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(thumb: &str) -> Video {
        Video {
            id: 0,
            title: "Sintel".into(),
            subtitle: "By Blender Foundation".into(),
            description: String::new(),
            sources: vec![],
            thumb: thumb.into(),
        }
    }

    #[test]
    fn thumb_url_joins_once() {
        let v = video("images/Sintel.jpg");
        assert_eq!(v.thumb_url("http://x/"), "http://x/images/Sintel.jpg");
        assert_eq!(v.thumb_url("http://x"), "http://x/images/Sintel.jpg");
    }

    #[test]
    fn no_sources_means_nothing_to_play() {
        assert!(video("a.jpg").primary_source().is_none());
    }
}
