use crate::player::{PlaybackState, Session};

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering},
};

/// Last published values, readable from any thread without touching the core.
#[derive(Debug)]
pub struct PlaybackMetrics {
    state: AtomicU8,
    current_secs: AtomicU64,
    total_secs: AtomicU64,
    playing: AtomicBool,
    muted: AtomicBool,
    volume: AtomicU8,
    url: Mutex<String>,
}

impl PlaybackMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(PlaybackMetrics {
            state: AtomicU8::new(PlaybackState::Unavailable.into()),
            current_secs: AtomicU64::new(0),
            total_secs: AtomicU64::new(0),
            playing: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            volume: AtomicU8::new(100),
            url: Mutex::new(String::new()),
        })
    }

    pub fn get_state(&self) -> PlaybackState {
        self.state
            .load(Ordering::Relaxed)
            .try_into()
            .unwrap_or(PlaybackState::Unavailable)
    }

    pub fn current_time(&self) -> u64 {
        self.current_secs.load(Ordering::Relaxed)
    }

    pub fn total_time(&self) -> u64 {
        self.total_secs.load(Ordering::Relaxed)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Relaxed)
    }

    pub fn current_url(&self) -> Option<String> {
        let url = self.url.lock().unwrap_or_else(|p| p.into_inner());
        (!url.is_empty()).then(|| url.clone())
    }

    pub(crate) fn sync(
        &self,
        state: PlaybackState,
        session: &Session,
        muted: bool,
        volume: u8,
    ) {
        self.state.store(state.into(), Ordering::Relaxed);
        self.current_secs
            .store(session.current_time_secs, Ordering::Relaxed);
        self.total_secs
            .store(session.total_time_secs, Ordering::Relaxed);
        self.playing.store(session.is_playing, Ordering::Relaxed);
        self.muted.store(muted, Ordering::Relaxed);
        self.volume.store(volume, Ordering::Relaxed);

        let mut url = self.url.lock().unwrap_or_else(|p| p.into_inner());
        if *url != session.url {
            url.clone_from(&session.url);
        }
    }
}
