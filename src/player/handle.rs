use crossbeam_channel::{Sender, bounded, unbounded};
use std::{sync::Arc, thread::JoinHandle};
use tracing::warn;

use crate::{
    config::PlayerConfig,
    error::{PlaybackError, Result},
    player::{
        LoadOptions, MediaBackend, Notifier, PlaybackMetrics, PlaybackState, PlayerCommand,
        Subscription, core::PlayerCore,
    },
};

/// Command surface of a player. Commands are queued to the core thread;
/// reads come from the last published metrics.
pub struct PlayerHandle {
    commands: Sender<PlayerCommand>,
    notifier: Arc<Notifier>,
    metrics: Arc<PlaybackMetrics>,
    seek_step: i64,
    core: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    pub fn spawn(backend: Box<dyn MediaBackend>, config: PlayerConfig) -> Result<Self> {
        config.validate()?;

        let (cmd_tx, cmd_rx) = unbounded();
        let notifier = Notifier::new();
        let metrics = PlaybackMetrics::new();
        let seek_step = config.seek_step_secs;

        let core = PlayerCore::spawn(
            backend,
            config,
            cmd_rx,
            Arc::clone(&notifier),
            Arc::clone(&metrics),
        )
        .map_err(|e| PlaybackError::Backend(format!("could not start player core: {e}")))?;

        Ok(Self {
            commands: cmd_tx,
            notifier,
            metrics,
            seek_step,
            core: Some(core),
        })
    }

    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.notifier.unsubscribe(subscription.id())
    }

    pub fn metrics(&self) -> Arc<PlaybackMetrics> {
        Arc::clone(&self.metrics)
    }
}

// =====================
//    COMMAND HANDLER
// =====================
impl PlayerHandle {
    pub fn load_session(&self, url: impl Into<String>, options: LoadOptions) -> Result<()> {
        self.commands
            .send(PlayerCommand::Load(url.into(), options))?;
        Ok(())
    }

    pub fn load(&self, url: impl Into<String>) -> Result<()> {
        self.load_session(url, LoadOptions::default())
    }

    pub fn reload_previous(&self) -> Result<()> {
        self.commands.send(PlayerCommand::ReloadPrevious)?;
        Ok(())
    }

    pub fn play(&self) -> Result<()> {
        self.commands.send(PlayerCommand::Play)?;
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        self.commands.send(PlayerCommand::Pause)?;
        Ok(())
    }

    /// Blocks until the core has stopped the session. No watchdog tick is
    /// processed after this returns.
    pub fn stop(&self) -> Result<()> {
        let (done_tx, done_rx) = bounded(1);
        self.commands.send(PlayerCommand::Stop(done_tx))?;
        done_rx.recv()?;
        Ok(())
    }

    pub fn forward(&self) -> Result<()> {
        self.seek_relative(self.seek_step)
    }

    pub fn backward(&self) -> Result<()> {
        self.seek_relative(self.seek_step.saturating_neg())
    }

    pub fn seek_relative(&self, delta_secs: i64) -> Result<()> {
        self.commands.send(PlayerCommand::SeekRelative(delta_secs))?;
        Ok(())
    }

    pub fn seek_absolute(&self, secs: i64) -> Result<()> {
        self.commands.send(PlayerCommand::SeekAbsolute(secs))?;
        Ok(())
    }

    pub fn set_volume(&self, percent: u8) -> Result<()> {
        self.commands.send(PlayerCommand::SetVolume(percent))?;
        Ok(())
    }

    pub fn mute(&self) -> Result<()> {
        self.commands.send(PlayerCommand::SetMuted(true))?;
        Ok(())
    }

    pub fn unmute(&self) -> Result<()> {
        self.commands.send(PlayerCommand::SetMuted(false))?;
        Ok(())
    }
}

// ===============
//    ACCESSORS
// ===============

impl PlayerHandle {
    pub fn state(&self) -> PlaybackState {
        self.metrics.get_state()
    }

    pub fn is_playing(&self) -> bool {
        self.metrics.is_playing()
    }

    pub fn is_muted(&self) -> bool {
        self.metrics.is_muted()
    }

    pub fn volume(&self) -> u8 {
        self.metrics.volume()
    }

    pub fn current_time(&self) -> u64 {
        self.metrics.current_time()
    }

    pub fn total_time(&self) -> u64 {
        self.metrics.total_time()
    }

    pub fn current_url(&self) -> Option<String> {
        self.metrics.current_url()
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(PlayerCommand::Shutdown);
        if let Some(core) = self.core.take() {
            if core.join().is_err() {
                warn!("player core panicked");
            }
        }
    }
}
