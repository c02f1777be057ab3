//! Contract between the session core and a media engine.
//!
//! Engines own decoding and transport. They receive commands through
//! [`MediaBackend`] and push everything they observe back through the
//! [`EventSink`] handed to them on each open. Events may be emitted from any
//! thread.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

use crate::{
    error::Result,
    player::{CoreInput, SessionId},
};

/// Transport lifecycle as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Opening,
    Playing,
    Paused,
    Ended,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Lifecycle(Lifecycle),
    TimeUpdated(u64),
    MediaLength(u64),
    Connectivity(bool),
}

/// Engine tuning forwarded with every open. Engines ignore what they do not
/// understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaOptions {
    pub network_caching_ms: u32,
    pub file_caching_ms: u32,
    pub aspect_ratio: String,
    pub rtsp_tcp: bool,
    pub mms_timeout_ms: u32,
    pub hardware_decoding: bool,
}

impl Default for MediaOptions {
    fn default() -> Self {
        MediaOptions {
            network_caching_ms: 300,
            file_caching_ms: 2000,
            aspect_ratio: String::from("16:9"),
            rtsp_tcp: true,
            mms_timeout_ms: 10_000,
            hardware_decoding: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    /// Passed through unmodified
    pub url: String,
    pub options: MediaOptions,
}

/// Forwards engine events into the core, tagged with the session that
/// opened the media. Events from a superseded session are discarded by the
/// core, so a sink may safely outlive its session.
#[derive(Debug, Clone)]
pub struct EventSink {
    session: SessionId,
    tx: Sender<CoreInput>,
}

impl EventSink {
    pub(crate) fn new(session: SessionId, tx: Sender<CoreInput>) -> Self {
        EventSink { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns false once the core has shut down.
    pub fn emit(&self, event: BackendEvent) -> bool {
        self.tx
            .send(CoreInput::Backend {
                session: self.session,
                event,
            })
            .is_ok()
    }

    pub fn lifecycle(&self, lifecycle: Lifecycle) -> bool {
        self.emit(BackendEvent::Lifecycle(lifecycle))
    }
}

pub trait MediaBackend: Send {
    /// Binds the engine to new media, tearing down whatever it held.
    /// Media failures are reported through the sink, not as `Err`.
    fn open(&mut self, request: &OpenRequest, events: EventSink) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Engines clamp the target into `[0, length]`.
    fn seek(&mut self, secs: i64);
    fn set_volume(&mut self, percent: u8);
    fn set_muted(&mut self, muted: bool);

    /// Optional snapshot capability
    fn thumbnailer(&self) -> Option<Arc<dyn Thumbnailer>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ThumbnailSize {
    /// Let the engine pick the media's own dimensions
    pub const ORIGINAL: ThumbnailSize = ThumbnailSize {
        width: None,
        height: None,
    };

    pub fn new(width: u32, height: u32) -> Self {
        ThumbnailSize {
            width: Some(width),
            height: Some(height),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row major
    pub pixels: Arc<[u8]>,
}

pub trait Thumbnailer: Send + Sync {
    /// Blocking; called off the core thread. Snapshot is taken at the start
    /// of the media.
    fn fetch(&self, url: &str, size: ThumbnailSize, timeout: Duration) -> Result<Thumbnail>;
}
