use crossbeam_channel::Sender;
use std::thread;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::PlayerConfig,
    error::{PlaybackError, Result},
    player::{
        BackendEvent, CoreInput, EventSink, Lifecycle, LoadOptions, MediaBackend, Notification,
        OpenRequest, PlaybackState, Session, SessionId, Thumbnail, ThumbnailSize, Watchdog,
        WatchdogTick,
    },
};

/// Reduces commands, engine events and watchdog ticks into one session's
/// state. Owns the backend and the watchdog; never blocks and never sleeps.
///
/// Notifications raised by a call are queued and handed out by
/// [`take_notifications`](Self::take_notifications).
pub struct SessionController {
    backend: Box<dyn MediaBackend>,
    inbox: Sender<CoreInput>,
    config: PlayerConfig,

    state: PlaybackState,
    session: Session,
    session_id: SessionId,
    previous_url: Option<String>,
    watchdog: Watchdog,

    muted: bool,
    volume: u8,
    connected: Option<bool>,
    last_error: Option<PlaybackError>,

    outbox: Vec<Notification>,
}

impl SessionController {
    pub fn new(
        mut backend: Box<dyn MediaBackend>,
        config: PlayerConfig,
        inbox: Sender<CoreInput>,
    ) -> Self {
        let volume = config.default_volume.min(100);
        backend.set_volume(volume);

        SessionController {
            backend,
            inbox,
            watchdog: Watchdog::new(config.watchdog_interval(), config.opening_timeout()),
            config,

            state: PlaybackState::Unavailable,
            session: Session::default(),
            session_id: SessionId::default(),
            previous_url: None,

            muted: false,
            volume,
            connected: None,
            last_error: None,

            outbox: Vec::new(),
        }
    }

    pub fn load_session(&mut self, url: &str, options: LoadOptions) {
        if !options.force_load && self.session.is_loaded() && self.session.url == url {
            debug!(url, "already loaded, skipping");
            return;
        }

        // A rejected url leaves the current media untouched
        if let Err(e) = validate_url(url) {
            warn!("rejecting load: {e}");
            self.fail(e);
            return;
        }

        self.reset_session();

        self.session = Session::new(url);
        self.previous_url = Some(url.to_string());
        self.last_error = None;

        let request = OpenRequest {
            url: url.to_string(),
            options: self.config.media.clone(),
        };
        let events = EventSink::new(self.session_id, self.inbox.clone());

        if let Err(e) = self.backend.open(&request, events) {
            warn!(session = %self.session_id, "backend refused media: {e}");
            self.fail(e);
            return;
        }

        info!(session = %self.session_id, url, "opening");
        self.transition(PlaybackState::Opening);
        self.watchdog.start();

        if options.autoplay {
            self.backend.play();
            self.session.is_playing = true;
        }

        if let Some(size) = options.thumbnail {
            self.request_thumbnail(size);
        }
    }

    /// Reopens the last accepted url, forcing a reload. No-op when nothing
    /// was ever loaded.
    pub fn reload_previous(&mut self) {
        match self.previous_url.clone() {
            Some(url) => self.load_session(&url, LoadOptions::forced()),
            None => debug!("nothing to reload"),
        }
    }

    pub fn play(&mut self) {
        if !self.session.is_loaded() {
            debug!("play ignored, no session");
            return;
        }
        self.backend.play();
        self.session.is_playing = true;
    }

    pub fn pause(&mut self) {
        if !self.session.is_loaded() {
            debug!("pause ignored, no session");
            return;
        }
        self.backend.pause();
        self.session.is_playing = false;
    }

    /// Releases the media and ends the session. Events still in flight from
    /// the stopped media are dropped.
    pub fn stop(&mut self) {
        self.backend.stop();
        self.reset_session();
    }

    pub fn seek_relative(&mut self, delta_secs: i64) {
        let current = i64::try_from(self.session.current_time_secs).unwrap_or(i64::MAX);
        self.seek_absolute(current.saturating_add(delta_secs));
    }

    pub fn seek_absolute(&mut self, secs: i64) {
        if !self.session.is_loaded() {
            debug!("seek ignored, no session");
            return;
        }
        self.backend.seek(secs);
        self.session.seek_pending = true;
    }

    pub fn forward(&mut self) {
        self.seek_relative(self.config.seek_step_secs);
    }

    pub fn backward(&mut self) {
        self.seek_relative(self.config.seek_step_secs.saturating_neg());
    }

    pub fn set_volume(&mut self, percent: u8) {
        let percent = percent.min(100);
        self.backend.set_volume(percent);
        self.volume = percent;
    }

    pub fn mute(&mut self) {
        self.set_muted(true);
    }

    pub fn unmute(&mut self) {
        self.set_muted(false);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.backend.set_muted(muted);
        self.muted = muted;
    }

    pub fn on_backend_event(&mut self, session: SessionId, event: BackendEvent) {
        if session != self.session_id {
            debug!(%session, current = %self.session_id, ?event, "dropping stale backend event");
            return;
        }

        match event {
            BackendEvent::Lifecycle(lifecycle) => self.on_lifecycle(lifecycle),
            BackendEvent::TimeUpdated(secs) => self.on_time_updated(secs),
            BackendEvent::MediaLength(secs) => {
                if self.session.accept_length(secs) {
                    self.push_time();
                }
            }
            BackendEvent::Connectivity(connected) => {
                if self.connected != Some(connected) {
                    self.connected = Some(connected);
                    self.outbox.push(Notification::ConnectivityChanged(connected));
                }
            }
        }
    }

    pub fn on_thumbnail(&mut self, session: SessionId, result: Result<Thumbnail>) {
        if session != self.session_id {
            debug!(%session, "dropping thumbnail for superseded session");
            return;
        }

        match result {
            Ok(thumbnail) => self.outbox.push(Notification::ThumbnailReady(Some(thumbnail))),
            Err(e) => {
                warn!(%session, "thumbnail unavailable: {e}");
                self.outbox.push(Notification::ThumbnailReady(None));
            }
        }
    }

    pub fn on_watchdog_tick(&mut self) {
        match self.watchdog.tick() {
            None => {}
            Some(WatchdogTick::Pending(elapsed)) => {
                debug!(session = %self.session_id, ?elapsed, "still opening");
            }
            Some(WatchdogTick::Expired) => {
                warn!(session = %self.session_id, url = %self.session.url, "opening timed out");
                self.backend.stop();
                self.fail(PlaybackError::OpeningTimeout);
                // Retire the stopped media so its queued events are dropped
                self.session_id = self.session_id.next();
            }
        }
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    fn on_lifecycle(&mut self, lifecycle: Lifecycle) {
        match lifecycle {
            Lifecycle::Opening => {
                // A repeated `opening` must not extend the timeout
                if self.state != PlaybackState::Opening {
                    self.transition(PlaybackState::Opening);
                    self.watchdog.start();
                }
            }
            Lifecycle::Playing => {
                self.session.is_playing = true;
                self.transition(PlaybackState::Playing);
            }
            Lifecycle::Paused => {
                self.session.is_playing = false;
                self.transition(PlaybackState::Paused);
            }
            Lifecycle::Ended => {
                self.watchdog.cancel();
                self.session.is_playing = false;
                self.transition(PlaybackState::Ended);
            }
            Lifecycle::Error => {
                self.fail(PlaybackError::Backend(String::from(
                    "engine reported a playback error",
                )));
            }
        }
    }

    fn on_time_updated(&mut self, secs: u64) {
        let first_frame = !self.session.is_first_frame_seen;
        let moved = self.session.accept_time(secs);

        if moved || first_frame {
            self.push_time();
        }

        if first_frame {
            self.session.is_first_frame_seen = true;
            self.outbox.push(Notification::StartedPlaying);
            if self.watchdog.cancel() {
                debug!(session = %self.session_id, "first frame, watchdog cancelled");
            }
        }
    }

    fn transition(&mut self, next: PlaybackState) {
        if self.state == next {
            return;
        }
        if self.state == PlaybackState::Opening {
            self.watchdog.cancel();
        }

        info!(session = %self.session_id, from = ?self.state, to = ?next, "state changed");
        self.state = next;
        self.outbox.push(Notification::StateChanged(next));
    }

    fn fail(&mut self, cause: PlaybackError) {
        self.watchdog.cancel();
        self.session.is_playing = false;
        self.last_error = Some(cause);
        self.transition(PlaybackState::Error);
    }

    fn reset_session(&mut self) {
        self.watchdog.cancel();

        let had_time = self.session.current_time_secs != 0 || self.session.total_time_secs != 0;
        self.session = Session::default();
        self.session_id = self.session_id.next();

        if had_time {
            self.push_time();
        }
    }

    fn push_time(&mut self) {
        self.outbox.push(Notification::TimeUpdated {
            current: self.session.current_time_secs,
            total: self.session.total_time_secs,
        });
    }

    fn request_thumbnail(&mut self, size: ThumbnailSize) {
        let Some(thumbnailer) = self.backend.thumbnailer() else {
            debug!("backend has no thumbnailer");
            return;
        };

        let inbox = self.inbox.clone();
        let session = self.session_id;
        let url = self.session.url.clone();
        let timeout = self.config.thumbnail_timeout();

        let spawned = thread::Builder::new()
            .name(String::from("vidplay-thumbnail"))
            .spawn(move || {
                let result = thumbnailer.fetch(&url, size, timeout);
                let _ = inbox.send(CoreInput::Thumbnail { session, result });
            });

        if let Err(e) = spawned {
            warn!("could not start thumbnail worker: {e}");
            self.outbox.push(Notification::ThumbnailReady(None));
        }
    }
}

// ===============
//    ACCESSORS
// ===============

impl SessionController {
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    /// Cause of the most recent `Error` transition
    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn current_time(&self) -> u64 {
        self.session.current_time_secs
    }

    pub fn total_time(&self) -> u64 {
        self.session.total_time_secs
    }

    pub fn previous_url(&self) -> Option<&str> {
        self.previous_url.as_deref()
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(PlaybackError::InvalidInput(url.to_string()));
    }
    Url::parse(url).map_err(|_| PlaybackError::InvalidInput(url.to_string()))?;
    Ok(())
}
