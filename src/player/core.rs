use crate::{
    config::PlayerConfig,
    error::Result,
    player::{
        BackendEvent, MediaBackend, Notifier, PlaybackMetrics, PlayerCommand, SessionController,
        SessionId, Thumbnail,
    },
};
use crossbeam_channel::{Receiver, Sender, never, select, tick, unbounded};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};
use tracing::{debug, info};

/// Everything that reaches the core from outside the command surface
#[derive(Debug)]
pub enum CoreInput {
    Backend {
        session: SessionId,
        event: BackendEvent,
    },
    Thumbnail {
        session: SessionId,
        result: Result<Thumbnail>,
    },
}

/// The single thread that mutates session state. Commands, engine events and
/// watchdog ticks are taken one at a time, so none of them interleave.
pub struct PlayerCore {
    controller: SessionController,
    commands: Receiver<PlayerCommand>,
    inputs: Receiver<CoreInput>,
    notifier: Arc<Notifier>,
    metrics: Arc<PlaybackMetrics>,

    // Generation of the watchdog run this ticker belongs to
    ticker: Option<(u64, Receiver<Instant>)>,
}

impl PlayerCore {
    pub fn spawn(
        backend: Box<dyn MediaBackend>,
        config: PlayerConfig,
        commands: Receiver<PlayerCommand>,
        notifier: Arc<Notifier>,
        metrics: Arc<PlaybackMetrics>,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(String::from("vidplay-core"))
            .spawn(move || {
                let (input_tx, input_rx): (Sender<CoreInput>, _) = unbounded();
                let controller = SessionController::new(backend, config, input_tx);

                let mut core = PlayerCore {
                    controller,
                    commands,
                    inputs: input_rx,
                    notifier,
                    metrics,

                    ticker: None,
                };

                core.flush();
                core.run();
            })
    }

    fn run(&mut self) {
        loop {
            let ticker = self
                .ticker
                .as_ref()
                .map(|(_, rx)| rx.clone())
                .unwrap_or_else(never);

            select! {
                recv(self.commands) -> cmd => match cmd {
                    Ok(PlayerCommand::Shutdown) | Err(_) => break,
                    Ok(cmd) => self.process_command(cmd),
                },
                recv(self.inputs) -> input => {
                    if let Ok(input) = input {
                        self.process_input(input);
                    }
                },
                recv(ticker) -> _ => self.controller.on_watchdog_tick(),
            }

            self.flush();
        }

        info!("player core shutting down");
        self.controller.stop();
        self.flush();
    }

    fn process_command(&mut self, cmd: PlayerCommand) {
        match cmd {
            PlayerCommand::Load(url, options) => self.controller.load_session(&url, options),
            PlayerCommand::ReloadPrevious => self.controller.reload_previous(),
            PlayerCommand::Play => self.controller.play(),
            PlayerCommand::Pause => self.controller.pause(),
            PlayerCommand::Stop(done) => {
                self.controller.stop();
                // Drop the ticker before acknowledging
                self.flush();
                let _ = done.send(());
            }
            PlayerCommand::SeekRelative(delta) => self.controller.seek_relative(delta),
            PlayerCommand::SeekAbsolute(secs) => self.controller.seek_absolute(secs),
            PlayerCommand::SetVolume(percent) => self.controller.set_volume(percent),
            PlayerCommand::SetMuted(muted) => self.controller.set_muted(muted),
            PlayerCommand::Shutdown => {}
        }
    }

    fn process_input(&mut self, input: CoreInput) {
        match input {
            CoreInput::Backend { session, event } => {
                self.controller.on_backend_event(session, event)
            }
            CoreInput::Thumbnail { session, result } => {
                self.controller.on_thumbnail(session, result)
            }
        }
    }

    /// Mirrors the controller into metrics, publishes queued notifications
    /// and re-arms or drops the watchdog ticker.
    fn flush(&mut self) {
        self.metrics.sync(
            self.controller.state(),
            self.controller.session(),
            self.controller.is_muted(),
            self.controller.volume(),
        );
        self.notifier.publish(self.controller.take_notifications());
        self.sync_ticker();
    }

    fn sync_ticker(&mut self) {
        let watchdog = self.controller.watchdog();

        if !watchdog.is_running() {
            if self.ticker.take().is_some() {
                debug!("watchdog ticker dropped");
            }
            return;
        }

        let generation = watchdog.generation();
        if self.ticker.as_ref().map(|(g, _)| *g) != Some(generation) {
            debug!(generation, interval = ?watchdog.interval(), "watchdog ticker armed");
            self.ticker = Some((generation, tick(watchdog.interval())));
        }
    }
}
