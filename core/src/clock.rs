use std::time::Duration;

use web_time::Instant;

/// Elapsed play time of one game, excluding paused spans.
///
/// Every operation has an `*_at` variant taking the current instant so callers and tests can drive it from
/// their own time source; the plain variants read [`Instant::now`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GameClock {
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    stopped_at: Option<Instant>,
    paused_total: Duration,
}

impl GameClock {
    pub fn started_at(now: Instant) -> Self {
        Self {
            started_at: Some(now),
            ..Self::default()
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    pub fn start(&mut self) {
        *self = Self::started_at(Instant::now());
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn pause_at(&mut self, now: Instant) {
        if self.is_started() && !self.is_paused() && !self.is_stopped() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub fn resume_at(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }

    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    /// Freezes the clock. Stopping while paused does not count the pause.
    pub fn stop_at(&mut self, now: Instant) {
        if !self.is_started() || self.is_stopped() {
            return;
        }
        self.resume_at(now);
        self.stopped_at = Some(now);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.stopped_at.or(self.paused_at).unwrap_or(now);
        end.saturating_duration_since(started_at)
            .saturating_sub(self.paused_total)
    }

    /// Elapsed time in whole milliseconds, the unit leaderboard times are kept in.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
    }
}
