// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how a [`TokenManager`](super::TokenManager) served tokens.
#[derive(Debug, Default)]
pub struct TokenMetrics {
	fetches: AtomicU64,
	cache_hits: AtomicU64,
	failures: AtomicU64,
}
impl TokenMetrics {
	/// Returns the number of token endpoint exchanges attempted.
	pub fn fetches(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of calls answered from the held token.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of failed exchanges.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_fetch(&self) {
		self.fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
