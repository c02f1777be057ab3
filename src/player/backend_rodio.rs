use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use rodio::{Decoder, OutputStreamBuilder, Sink, Source};
use std::{
    fs::File,
    path::PathBuf,
    thread::{self, JoinHandle},
    time::Duration,
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    REFRESH_RATE,
    error::{PlaybackError, Result},
    player::{BackendEvent, EventSink, Lifecycle, MediaBackend, OpenRequest},
};

enum AudioCommand {
    Open(PathBuf, EventSink),
    Play,
    Pause,
    Stop,
    Seek(i64),
    Volume(f32),
    Shutdown,
}

/// Local audio files through rodio. The output stream lives on a dedicated
/// thread; this handle only queues commands to it.
pub struct RodioBackend {
    commands: Sender<AudioCommand>,
    thread: Option<JoinHandle<()>>,
    volume: f32,
    muted: bool,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let (cmd_tx, cmd_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        let thread = thread::Builder::new()
            .name(String::from("vidplay-rodio"))
            .spawn(move || {
                let stream = match OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(PlaybackError::Backend(e.to_string())));
                        return;
                    }
                };
                let sink = Sink::connect_new(stream.mixer());
                let _ = ready_tx.send(Ok(()));

                AudioWorker::new(sink, cmd_rx).run();
                drop(stream);
            })
            .map_err(|e| PlaybackError::Backend(format!("could not start audio thread: {e}")))?;

        ready_rx.recv()??;

        Ok(RodioBackend {
            commands: cmd_tx,
            thread: Some(thread),
            volume: 1.0,
            muted: false,
        })
    }

    fn send(&self, cmd: AudioCommand) {
        let _ = self.commands.send(cmd);
    }

    fn apply_volume(&self) {
        let volume = if self.muted { 0.0 } else { self.volume };
        self.send(AudioCommand::Volume(volume));
    }
}

impl MediaBackend for RodioBackend {
    fn open(&mut self, request: &OpenRequest, events: EventSink) -> Result<()> {
        let path = local_path(&request.url)?;
        self.send(AudioCommand::Open(path, events));
        Ok(())
    }

    fn play(&mut self) {
        self.send(AudioCommand::Play);
    }

    fn pause(&mut self) {
        self.send(AudioCommand::Pause);
    }

    fn stop(&mut self) {
        self.send(AudioCommand::Stop);
    }

    fn seek(&mut self, secs: i64) {
        self.send(AudioCommand::Seek(secs));
    }

    fn set_volume(&mut self, percent: u8) {
        self.volume = f32::from(percent.min(100)) / 100.0;
        self.apply_volume();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_volume();
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn local_path(url: &str) -> Result<PathBuf> {
    let parsed = Url::parse(url).map_err(|_| PlaybackError::InvalidInput(url.to_string()))?;
    match parsed.scheme() {
        "file" => parsed
            .to_file_path()
            .map_err(|_| PlaybackError::InvalidInput(url.to_string())),
        scheme => Err(PlaybackError::Backend(format!(
            "rodio backend only plays local files, got {scheme}://"
        ))),
    }
}

struct AudioWorker {
    sink: Sink,
    commands: Receiver<AudioCommand>,
    events: Option<EventSink>,
    length: u64,
    last_reported: Option<u64>,
    playing: bool,
}

impl AudioWorker {
    fn new(sink: Sink, commands: Receiver<AudioCommand>) -> Self {
        AudioWorker {
            sink,
            commands,
            events: None,
            length: 0,
            last_reported: None,
            playing: false,
        }
    }

    fn run(&mut self) {
        loop {
            match self.commands.recv_timeout(REFRESH_RATE) {
                Ok(AudioCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(cmd) => self.process(cmd),
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.poll();
        }
        self.sink.clear();
    }

    fn emit(&self, event: BackendEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    fn process(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Open(path, events) => self.open(path, events),
            AudioCommand::Play => {
                if self.events.is_some() && !self.sink.empty() {
                    self.sink.play();
                    self.playing = true;
                    self.emit(BackendEvent::Lifecycle(Lifecycle::Playing));
                }
            }
            AudioCommand::Pause => {
                if self.playing {
                    self.sink.pause();
                    self.playing = false;
                    self.emit(BackendEvent::Lifecycle(Lifecycle::Paused));
                }
            }
            AudioCommand::Stop => {
                self.sink.clear();
                self.playing = false;
                self.events = None;
            }
            AudioCommand::Seek(secs) => {
                let target = secs.clamp(0, self.length as i64) as u64;
                if let Err(e) = self.sink.try_seek(Duration::from_secs(target)) {
                    warn!("seek failed: {e}");
                }
                self.last_reported = None;
            }
            AudioCommand::Volume(volume) => self.sink.set_volume(volume),
            AudioCommand::Shutdown => {}
        }
    }

    fn open(&mut self, path: PathBuf, events: EventSink) {
        self.sink.clear();
        self.playing = false;
        self.last_reported = None;
        self.events = Some(events);
        self.emit(BackendEvent::Lifecycle(Lifecycle::Opening));

        let source = File::open(&path)
            .map_err(|e| e.to_string())
            .and_then(|file| Decoder::try_from(file).map_err(|e| e.to_string()));

        match source {
            Ok(source) => {
                self.length = source.total_duration().map_or(0, |d| d.as_secs());
                debug!(path = %path.display(), length = self.length, "decoded");
                self.sink.append(source);
                self.emit(BackendEvent::MediaLength(self.length));
            }
            Err(e) => {
                warn!(path = %path.display(), "could not decode: {e}");
                self.emit(BackendEvent::Lifecycle(Lifecycle::Error));
                self.events = None;
            }
        }
    }

    fn poll(&mut self) {
        if !self.playing {
            return;
        }

        if self.sink.empty() {
            self.playing = false;
            self.emit(BackendEvent::Lifecycle(Lifecycle::Ended));
            return;
        }

        let position = self.sink.get_pos().as_secs();
        if self.last_reported != Some(position) {
            self.last_reported = Some(position);
            self.emit(BackendEvent::TimeUpdated(position));
        }
    }
}
