#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use vidplay::{
    PlayerConfig,
    error::Result,
    player::{BackendEvent, EventSink, MediaBackend, Notification, OpenRequest, Subscription},
};

pub const URL: &str = "http://x/a.mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String),
    Play,
    Pause,
    Stop,
    Seek(i64),
    Volume(u8),
    Muted(bool),
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    sinks: Vec<EventSink>,
}

/// Test side of a [`RecordingBackend`]: inspects calls and plays the engine
#[derive(Clone, Default)]
pub struct Probe {
    shared: Arc<Mutex<Shared>>,
}

impl Probe {
    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn opens(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Open(_)))
            .count()
    }

    /// Emits through the sink of the most recent open
    pub fn emit(&self, event: BackendEvent) {
        let sink = self.shared.lock().unwrap().sinks.last().cloned();
        sink.expect("no media opened yet").emit(event);
    }

    /// Emits through the sink of the `nth` open (0-based)
    pub fn emit_from(&self, nth: usize, event: BackendEvent) {
        let sink = self.shared.lock().unwrap().sinks[nth].clone();
        sink.emit(event);
    }
}

pub struct RecordingBackend {
    probe: Probe,
}

impl RecordingBackend {
    pub fn new() -> (Self, Probe) {
        let probe = Probe::default();
        (
            RecordingBackend {
                probe: probe.clone(),
            },
            probe,
        )
    }

    fn record(&self, call: Call) {
        self.probe.shared.lock().unwrap().calls.push(call);
    }
}

impl MediaBackend for RecordingBackend {
    fn open(&mut self, request: &OpenRequest, events: EventSink) -> Result<()> {
        let mut shared = self.probe.shared.lock().unwrap();
        shared.calls.push(Call::Open(request.url.clone()));
        shared.sinks.push(events);
        Ok(())
    }

    fn play(&mut self) {
        self.record(Call::Play);
    }

    fn pause(&mut self) {
        self.record(Call::Pause);
    }

    fn stop(&mut self) {
        self.record(Call::Stop);
    }

    fn seek(&mut self, secs: i64) {
        self.record(Call::Seek(secs));
    }

    fn set_volume(&mut self, percent: u8) {
        self.record(Call::Volume(percent));
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(Call::Muted(muted));
    }
}

/// 20ms watchdog ticks, 200ms opening timeout
pub fn fast_config() -> PlayerConfig {
    PlayerConfig {
        watchdog_interval_ms: 20,
        opening_timeout_ms: 200,
        ..Default::default()
    }
}

/// Collects notifications until one matches `pred` or `timeout` passes.
/// Returns everything seen, the match last.
pub fn wait_for<F>(sub: &Subscription, timeout: Duration, pred: F) -> Option<Vec<Notification>>
where
    F: Fn(&Notification) -> bool,
{
    let deadline = Instant::now() + timeout;
    let mut seen = Vec::new();

    loop {
        let remaining = deadline.checked_duration_since(Instant::now())?;
        let notification = sub.recv_timeout(remaining).ok()?;
        let matched = pred(&notification);
        seen.push(notification);
        if matched {
            return Some(seen);
        }
    }
}

pub fn states(notifications: &[Notification]) -> Vec<vidplay::PlaybackState> {
    notifications
        .iter()
        .filter_map(|n| match n {
            Notification::StateChanged(s) => Some(*s),
            _ => None,
        })
        .collect()
}
