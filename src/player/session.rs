use std::fmt;

/// Identifies one load-to-stop lifecycle. Monotonic per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn next(self) -> SessionId {
        SessionId(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub url: String,
    pub is_first_frame_seen: bool,
    pub is_playing: bool,
    pub current_time_secs: u64,
    pub total_time_secs: u64,
    /// Set by a seek command; lets the next time update move the playhead
    /// backwards.
    pub seek_pending: bool,
}

impl Session {
    pub fn new(url: impl Into<String>) -> Self {
        Session {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.url.is_empty()
    }

    /// Applies a playhead report. Returns true when the published time moved.
    pub fn accept_time(&mut self, secs: u64) -> bool {
        if secs < self.current_time_secs && !self.seek_pending {
            return false;
        }
        self.seek_pending = false;

        let changed = secs != self.current_time_secs;
        self.current_time_secs = secs;
        changed
    }

    pub fn accept_length(&mut self, secs: u64) -> bool {
        let changed = secs != self.total_time_secs;
        self.total_time_secs = secs;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playhead_never_moves_back_without_seek() {
        let mut s = Session::new("http://x/a.mp4");
        assert!(s.accept_time(5));
        assert!(!s.accept_time(3));
        assert_eq!(s.current_time_secs, 5);

        s.seek_pending = true;
        assert!(s.accept_time(1));
        assert_eq!(s.current_time_secs, 1);
        assert!(!s.seek_pending);
    }

    #[test]
    fn repeated_time_is_not_a_change() {
        let mut s = Session::new("http://x/a.mp4");
        assert!(!s.accept_time(0));
        assert!(s.accept_length(60));
        assert!(!s.accept_length(60));
    }
}
