use chrono::{DateTime, FixedOffset, Utc};

/// Time source for everything clock-dependent: mode selection, staleness,
/// failure durations, brief headers. Pulses take `&dyn Clock` so tests can
/// pin the time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Shift a UTC instant into the configured local offset.
pub fn to_local(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    now.with_timezone(&offset)
}
