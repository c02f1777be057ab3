mod backend;
#[cfg(feature = "rodio")]
mod backend_rodio;
mod backend_sim;
mod controller;
mod core;
mod handle;
mod metrics;
mod notify;
mod session;
mod watchdog;

pub use backend::{
    BackendEvent, EventSink, Lifecycle, MediaBackend, MediaOptions, OpenRequest, Thumbnail,
    ThumbnailSize, Thumbnailer,
};
#[cfg(feature = "rodio")]
pub use backend_rodio::RodioBackend;
pub use backend_sim::{SimulatedBackend, SimulatedBehavior};
pub use controller::SessionController;
pub use handle::PlayerHandle;
pub use metrics::PlaybackMetrics;
pub use notify::{Notification, Notifier, Subscription};
pub use session::{Session, SessionId};
pub use watchdog::{Watchdog, WatchdogTick};

pub use self::core::CoreInput;

use crossbeam_channel::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PlaybackState {
    #[default]
    Unavailable = 0,
    Opening = 1,
    Playing = 2,
    Paused = 3,
    Ended = 4,
    Error = 5,
}

impl From<PlaybackState> for u8 {
    fn from(state: PlaybackState) -> u8 {
        state as u8
    }
}

impl TryFrom<u8> for PlaybackState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(PlaybackState::Unavailable),
            1 => Ok(PlaybackState::Opening),
            2 => Ok(PlaybackState::Playing),
            3 => Ok(PlaybackState::Paused),
            4 => Ok(PlaybackState::Ended),
            5 => Ok(PlaybackState::Error),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Reload even when the url matches the current session
    pub force_load: bool,
    pub autoplay: bool,
    pub thumbnail: Option<ThumbnailSize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            force_load: false,
            autoplay: true,
            thumbnail: None,
        }
    }
}

impl LoadOptions {
    pub fn forced() -> Self {
        LoadOptions {
            force_load: true,
            ..Default::default()
        }
    }

    pub fn with_thumbnail(mut self, size: ThumbnailSize) -> Self {
        self.thumbnail = Some(size);
        self
    }
}

pub enum PlayerCommand {
    Load(String, LoadOptions),
    ReloadPrevious,
    Play,
    Pause,
    Stop(Sender<()>),
    SeekRelative(i64),
    SeekAbsolute(i64),
    SetVolume(u8),
    SetMuted(bool),
    Shutdown,
}
