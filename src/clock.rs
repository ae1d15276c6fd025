//! Time sources consulted by the token manager for freshness checks.

// self
use crate::_prelude::*;

/// Source of "now" for token expiry calculations.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for simulations and tests.
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Mutex::new(start))
	}

	/// Moves the clock forward (or backward, for negative durations).
	pub fn advance(&self, by: Duration) {
		*self.0.lock() += by;
	}

	/// Jumps to an absolute instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
