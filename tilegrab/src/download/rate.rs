//! Release-rate gate for the feeder.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Token bucket of size one.
///
/// Each [`tick`](Self::tick) completes one period after the previous one;
/// the first completes one period after creation. Ticks missed while the
/// caller was busy are delayed rather than fired in a burst, so the release
/// rate never exceeds `1 / period`.
#[derive(Debug)]
pub struct RateGate {
    interval: Interval,
}

impl RateGate {
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_nanos(1));
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Waits for the next release slot.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
