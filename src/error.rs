use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Empty or unparseable media locator, rejected before the backend is touched
    #[error("invalid media url: {0:?}")]
    InvalidInput(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("media did not start within the opening timeout")]
    OpeningTimeout,
    #[error("thumbnail generation timed out")]
    ThumbnailTimeout,
    #[error("player core is not running")]
    Disconnected,
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PlaybackError {
    /// Causes that drive the session into `PlaybackState::Error`.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidInput(_) | PlaybackError::Backend(_) | PlaybackError::OpeningTimeout
        )
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;

impl<T> From<crossbeam_channel::SendError<T>> for PlaybackError {
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        PlaybackError::Disconnected
    }
}

impl From<crossbeam_channel::RecvError> for PlaybackError {
    fn from(_: crossbeam_channel::RecvError) -> Self {
        PlaybackError::Disconnected
    }
}
