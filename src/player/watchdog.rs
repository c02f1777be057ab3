use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogTick {
    Pending(Duration),
    Expired,
}

/// Counts time spent in `Opening`.
///
/// The counter itself never sleeps; whoever owns it feeds `tick()` once per
/// `interval`. Every `start`/`cancel` bumps `generation`, which is how the
/// owner knows to drop the timer it armed for an earlier run.
#[derive(Debug, Clone)]
pub struct Watchdog {
    interval: Duration,
    timeout: Duration,
    elapsed: Duration,
    running: bool,
    generation: u64,
}

impl Watchdog {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Watchdog {
            interval,
            timeout,
            elapsed: Duration::ZERO,
            running: false,
            generation: 0,
        }
    }

    pub fn start(&mut self) {
        self.elapsed = Duration::ZERO;
        self.running = true;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Idempotent. Returns whether a running watchdog was stopped.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.running;
        self.elapsed = Duration::ZERO;
        if was_running {
            self.running = false;
            self.generation = self.generation.wrapping_add(1);
        }
        was_running
    }

    /// `None` when not running; a stopped watchdog ignores late ticks.
    pub fn tick(&mut self) -> Option<WatchdogTick> {
        if !self.running {
            return None;
        }

        self.elapsed += self.interval;
        if self.elapsed >= self.timeout {
            self.cancel();
            return Some(WatchdogTick::Expired);
        }
        Some(WatchdogTick::Pending(self.elapsed))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
