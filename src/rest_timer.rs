use chrono::{DateTime, Duration, Local};

pub const REST_SECS: i64 = 30;

/// Countdown between sets. Time is passed in so the app drives it from its
/// frame clock.
#[derive(Clone, Debug)]
pub struct RestTimer {
    total: Duration,
    left: Duration,
    started: Option<DateTime<Local>>,
}

impl Default for RestTimer {
    fn default() -> Self {
        Self::new(Duration::seconds(REST_SECS))
    }
}

impl RestTimer {
    pub fn new(total: Duration) -> Self {
        Self {
            total,
            left: total,
            started: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn toggle(&mut self, now: DateTime<Local>) {
        if self.is_running() {
            self.left = self.remaining(now);
            self.started = None;
        } else if self.left > Duration::zero() {
            self.started = Some(now);
        }
    }

    pub fn reset(&mut self) {
        self.left = self.total;
        self.started = None;
    }

    /// Stops the clock once it reaches zero.
    pub fn tick(&mut self, now: DateTime<Local>) {
        if self.is_running() && self.remaining(now) <= Duration::zero() {
            self.left = Duration::zero();
            self.started = None;
        }
    }

    pub fn remaining(&self, now: DateTime<Local>) -> Duration {
        match self.started {
            Some(start) => (self.left - (now - start)).max(Duration::zero()),
            None => self.left,
        }
    }

    pub fn fraction_left(&self, now: DateTime<Local>) -> f32 {
        if self.total <= Duration::zero() {
            return 0.0;
        }
        self.remaining(now).num_milliseconds() as f32 / self.total.num_milliseconds() as f32
    }
}
