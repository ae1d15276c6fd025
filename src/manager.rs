//! Credential token manager: cached access tokens with singleflight refreshes.
//!
//! [`TokenManager::get_token`] hands out the held token while it is valid and otherwise runs
//! exactly one client-credentials exchange, even when many callers arrive at once. The held
//! token lives in a [`RwLock`] slot that is only ever replaced wholesale; the exchange itself
//! runs under a single async mutex so concurrent callers queue behind the in-flight refresh
//! and re-check the slot once it completes.

mod client_credentials;
mod metrics;

pub use metrics::*;

// self
use crate::{
	_prelude::*,
	auth::{SeedToken, Token},
	clock::{Clock, SystemClock},
	config::ClientConfig,
	error::ConfigError,
	http::HttpTransport,
	obs::{self, OperationKind, OperationOutcome},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Token manager specialized for the crate's default reqwest transport.
pub type ReqwestTokenManager = TokenManager<ReqwestHttpClient>;

/// Owns the consumer credentials and the current access token.
///
/// The manager is `Send + Sync`; share it behind an [`Arc`] between the payment façade and
/// any other caller that needs a bearer token.
pub struct TokenManager<C>
where
	C: ?Sized + HttpTransport,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Credentials, partner identity, environment, and logging.
	pub config: ClientConfig,
	clock: Arc<dyn Clock>,
	current: RwLock<Option<Token>>,
	refresh_guard: AsyncMutex<()>,
	metrics: TokenMetrics,
}
impl<C> TokenManager<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a manager that reuses the caller-provided transport.
	pub fn with_http_client(config: ClientConfig, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			config,
			clock: Arc::new(SystemClock),
			current: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			metrics: TokenMetrics::default(),
		}
	}

	/// Replaces the time source used for freshness checks and expiry calculations.
	///
	/// Call this before [`with_token`](Self::with_token) so relative seed expiries count from
	/// the same clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Adopts a pre-existing token; no exchange happens until it reaches its safety margin.
	pub fn with_token(self, seed: impl Into<SeedToken>) -> Result<Self> {
		let token = seed.into().resolve(self.clock.now()).map_err(ConfigError::from)?;

		self.config.log.in_scope(|| {
			tracing::debug!(expires_at = %token.expires_at, "adopted seed token");
		});

		*self.current.write() = Some(token);

		Ok(self)
	}

	/// Returns a token valid at the moment of the call, fetching one when needed.
	///
	/// A held token that is still valid is returned without any network interaction.
	/// Otherwise the caller either performs the exchange or, if another caller is already
	/// doing so, waits for it and reuses its result.
	pub async fn get_token(&self) -> Result<Token> {
		if let Some(token) = self.valid_token() {
			self.metrics.record_cache_hit();

			return Ok(token);
		}

		self.config
			.log
			.instrument_op(OperationKind::TokenFetch, "get_token", async {
				let _singleflight = self.refresh_guard.lock().await;

				if let Some(token) = self.valid_token() {
					tracing::debug!("token refreshed by a concurrent caller");
					self.metrics.record_cache_hit();

					return Ok(token);
				}

				self.refresh_locked().await
			})
			.await
	}

	/// Discards the held token and unconditionally performs one exchange.
	///
	/// Use this after a protected call failed with [`Error::Unauthorized`].
	pub async fn force_refresh(&self) -> Result<Token> {
		self.current.write().take();

		self.config
			.log
			.instrument_op(OperationKind::TokenFetch, "force_refresh", async {
				let _singleflight = self.refresh_guard.lock().await;

				self.refresh_locked().await
			})
			.await
	}

	/// Returns the held token without fetching; it may be stale or absent.
	pub fn current_token(&self) -> Option<Token> {
		self.current.read().clone()
	}

	/// Counters describing how tokens were served.
	pub fn metrics(&self) -> &TokenMetrics {
		&self.metrics
	}

	/// Current instant according to the manager's clock.
	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	fn valid_token(&self) -> Option<Token> {
		let now = self.clock.now();

		self.current.read().as_ref().filter(|token| token.is_valid_at(now)).cloned()
	}

	// Must be called with `refresh_guard` held.
	async fn refresh_locked(&self) -> Result<Token> {
		obs::record_outcome(OperationKind::TokenFetch, OperationOutcome::Attempt);
		self.metrics.record_fetch();

		let result = self.exchange_client_credentials().await;

		obs::record_result(OperationKind::TokenFetch, &result);

		match result {
			Ok(token) => {
				tracing::info!(expires_at = %token.expires_at, "installed new access token");

				*self.current.write() = Some(token.clone());

				Ok(token)
			},
			Err(e) => {
				self.metrics.record_failure();

				Err(e)
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager<ReqwestHttpClient> {
	/// Creates a manager backed by a default reqwest client.
	pub fn new(config: ClientConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Debug for TokenManager<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("config", &self.config)
			.field("token_held", &self.current.read().is_some())
			.field("metrics", &self.metrics)
			.finish()
	}
}
