use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use rand::Rng;
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{debug, warn};

use crate::{
    REFRESH_RATE,
    error::{PlaybackError, Result},
    player::{
        BackendEvent, EventSink, Lifecycle, MediaBackend, OpenRequest, Thumbnail, ThumbnailSize,
        Thumbnailer,
    },
};

const DEFAULT_THUMB: (u32, u32) = (320, 180);

/// How the simulated engine treats every media it opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedBehavior {
    /// Opens after a short random delay and plays `length_secs` of media
    Normal { length_secs: u64 },
    /// Reports `opening` and then goes quiet
    StallOnOpen,
    /// Reports `opening`, then an engine error
    FailOnOpen,
}

enum SimControl {
    Play,
    Pause,
    Seek(i64),
    Shutdown,
}

struct SimWorker {
    control: Sender<SimControl>,
    thread: JoinHandle<()>,
}

/// In-process engine that fakes transport timing on its own thread. Each
/// open replaces the previous media worker, like a real engine rebinding to
/// new media.
pub struct SimulatedBackend {
    behavior: SimulatedBehavior,
    worker: Option<SimWorker>,
    volume: u8,
    muted: bool,
}

impl SimulatedBackend {
    pub fn new(behavior: SimulatedBehavior) -> Self {
        SimulatedBackend {
            behavior,
            worker: None,
            volume: 100,
            muted: false,
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn send(&self, control: SimControl) {
        if let Some(worker) = &self.worker {
            let _ = worker.control.send(control);
        }
    }

    fn teardown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.control.send(SimControl::Shutdown);
            if worker.thread.join().is_err() {
                warn!("simulated media worker panicked");
            }
        }
    }
}

impl Default for SimulatedBehavior {
    fn default() -> Self {
        SimulatedBehavior::Normal { length_secs: 596 }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        SimulatedBackend::new(SimulatedBehavior::default())
    }
}

impl MediaBackend for SimulatedBackend {
    fn open(&mut self, request: &OpenRequest, events: EventSink) -> Result<()> {
        self.teardown();

        let (control_tx, control_rx) = unbounded();
        let behavior = self.behavior;
        let latency = Duration::from_millis(rand::rng().random_range(100..400));
        debug!(url = %request.url, ?latency, "simulated open");

        let thread = thread::Builder::new()
            .name(String::from("vidplay-sim"))
            .spawn(move || MediaSim::new(behavior, latency, events, control_rx).run())
            .map_err(|e| PlaybackError::Backend(format!("could not start simulated media: {e}")))?;

        self.worker = Some(SimWorker {
            control: control_tx,
            thread,
        });
        Ok(())
    }

    fn play(&mut self) {
        self.send(SimControl::Play);
    }

    fn pause(&mut self) {
        self.send(SimControl::Pause);
    }

    fn stop(&mut self) {
        self.teardown();
    }

    fn seek(&mut self, secs: i64) {
        self.send(SimControl::Seek(secs));
    }

    fn set_volume(&mut self, percent: u8) {
        self.volume = percent.min(100);
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn thumbnailer(&self) -> Option<Arc<dyn Thumbnailer>> {
        Some(Arc::new(SimulatedThumbnailer {
            behavior: self.behavior,
        }))
    }
}

impl Drop for SimulatedBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}

struct MediaSim {
    behavior: SimulatedBehavior,
    events: EventSink,
    control: Receiver<SimControl>,

    opens_at: Instant,
    opened: bool,
    want_play: bool,
    playing: bool,
    position: u64,
    carry: Duration,
    last_poll: Instant,
}

impl MediaSim {
    fn new(
        behavior: SimulatedBehavior,
        latency: Duration,
        events: EventSink,
        control: Receiver<SimControl>,
    ) -> Self {
        let now = Instant::now();
        MediaSim {
            behavior,
            events,
            control,

            opens_at: now + latency,
            opened: false,
            want_play: false,
            playing: false,
            position: 0,
            carry: Duration::ZERO,
            last_poll: now,
        }
    }

    fn run(&mut self) {
        self.events.lifecycle(Lifecycle::Opening);

        loop {
            match self.control.recv_timeout(REFRESH_RATE) {
                Ok(SimControl::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(control) => self.apply(control),
                Err(RecvTimeoutError::Timeout) => {}
            }

            if !self.advance() {
                break;
            }
        }
    }

    fn length(&self) -> Option<u64> {
        match self.behavior {
            SimulatedBehavior::Normal { length_secs } => Some(length_secs),
            _ => None,
        }
    }

    fn apply(&mut self, control: SimControl) {
        match control {
            SimControl::Play => {
                self.want_play = true;
                if self.opened && !self.playing {
                    self.playing = true;
                    self.last_poll = Instant::now();
                    self.events.lifecycle(Lifecycle::Playing);
                }
            }
            SimControl::Pause => {
                self.want_play = false;
                if self.opened && self.playing {
                    self.playing = false;
                    self.events.lifecycle(Lifecycle::Paused);
                }
            }
            SimControl::Seek(secs) => {
                if let Some(length) = self.length().filter(|_| self.opened) {
                    self.position = secs.clamp(0, length as i64) as u64;
                    self.carry = Duration::ZERO;
                    self.events.emit(BackendEvent::TimeUpdated(self.position));
                }
            }
            SimControl::Shutdown => {}
        }
    }

    /// Returns false once the media has nothing more to report.
    fn advance(&mut self) -> bool {
        let now = Instant::now();

        if !self.opened {
            if now < self.opens_at {
                return true;
            }
            return self.finish_opening();
        }

        if self.playing {
            self.carry += now - self.last_poll;
            while self.carry >= Duration::from_secs(1) {
                self.carry -= Duration::from_secs(1);
                self.position += 1;
                self.events.emit(BackendEvent::TimeUpdated(self.position));
            }

            if self.length().is_some_and(|length| self.position >= length) {
                self.playing = false;
                self.events.lifecycle(Lifecycle::Ended);
            }
        }
        self.last_poll = now;
        true
    }

    fn finish_opening(&mut self) -> bool {
        match self.behavior {
            SimulatedBehavior::StallOnOpen => true,
            SimulatedBehavior::FailOnOpen => {
                self.events.lifecycle(Lifecycle::Error);
                false
            }
            SimulatedBehavior::Normal { length_secs } => {
                self.opened = true;
                self.last_poll = Instant::now();
                self.events.emit(BackendEvent::Connectivity(true));
                self.events.emit(BackendEvent::MediaLength(length_secs));
                self.events.emit(BackendEvent::TimeUpdated(0));

                if self.want_play {
                    self.playing = true;
                    self.events.lifecycle(Lifecycle::Playing);
                }
                true
            }
        }
    }
}

struct SimulatedThumbnailer {
    behavior: SimulatedBehavior,
}

impl Thumbnailer for SimulatedThumbnailer {
    fn fetch(&self, url: &str, size: ThumbnailSize, timeout: Duration) -> Result<Thumbnail> {
        match self.behavior {
            SimulatedBehavior::Normal { .. } => {
                let width = size.width.unwrap_or(DEFAULT_THUMB.0);
                let height = size.height.unwrap_or(DEFAULT_THUMB.1);

                // Flat color picked from the url so different media differ
                let seed = url.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
                let pixel = [seed, seed.wrapping_mul(3), seed.wrapping_mul(7), 255];
                let pixels: Vec<u8> = pixel
                    .iter()
                    .copied()
                    .cycle()
                    .take((width * height * 4) as usize)
                    .collect();

                Ok(Thumbnail {
                    width,
                    height,
                    pixels: Arc::from(pixels),
                })
            }
            _ => {
                thread::sleep(timeout.min(Duration::from_millis(50)));
                Err(PlaybackError::ThumbnailTimeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{CoreInput, SessionId};

    fn next_event(rx: &Receiver<CoreInput>) -> BackendEvent {
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            CoreInput::Backend { event, .. } => event,
            CoreInput::Thumbnail { .. } => panic!("unexpected thumbnail"),
        }
    }

    fn request() -> OpenRequest {
        OpenRequest {
            url: "http://x/a.mp4".into(),
            options: Default::default(),
        }
    }

    #[test]
    fn normal_media_opens_then_plays() {
        let (tx, rx) = unbounded();
        let mut backend = SimulatedBackend::new(SimulatedBehavior::Normal { length_secs: 60 });
        backend
            .open(&request(), EventSink::new(SessionId::default(), tx))
            .unwrap();
        backend.play();

        assert_eq!(next_event(&rx), BackendEvent::Lifecycle(Lifecycle::Opening));
        assert_eq!(next_event(&rx), BackendEvent::Connectivity(true));
        assert_eq!(next_event(&rx), BackendEvent::MediaLength(60));
        assert_eq!(next_event(&rx), BackendEvent::TimeUpdated(0));
        assert_eq!(next_event(&rx), BackendEvent::Lifecycle(Lifecycle::Playing));

        backend.stop();
    }

    #[test]
    fn failing_media_reports_error() {
        let (tx, rx) = unbounded();
        let mut backend = SimulatedBackend::new(SimulatedBehavior::FailOnOpen);
        backend
            .open(&request(), EventSink::new(SessionId::default(), tx))
            .unwrap();

        assert_eq!(next_event(&rx), BackendEvent::Lifecycle(Lifecycle::Opening));
        assert_eq!(next_event(&rx), BackendEvent::Lifecycle(Lifecycle::Error));
    }

    #[test]
    fn thumbnail_honors_requested_size() {
        let backend = SimulatedBackend::default();
        let thumbnailer = backend.thumbnailer().unwrap();
        let thumb = thumbnailer
            .fetch("http://x/a.mp4", ThumbnailSize::new(4, 2), Duration::from_secs(1))
            .unwrap();

        assert_eq!((thumb.width, thumb.height), (4, 2));
        assert_eq!(thumb.pixels.len(), 32);
    }

    #[test]
    fn stalled_media_thumbnail_times_out() {
        let backend = SimulatedBackend::new(SimulatedBehavior::StallOnOpen);
        let result = backend.thumbnailer().unwrap().fetch(
            "http://x/a.mp4",
            ThumbnailSize::ORIGINAL,
            Duration::from_millis(10),
        );
        assert_eq!(result, Err(PlaybackError::ThumbnailTimeout));
    }
}
