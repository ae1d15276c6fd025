//! Merchant-pay operations: initiate a payment, poll its status, fetch transaction details.
//!
//! Every operation asks the [`TokenManager`] for a token right before building its headers
//! and uses that token for exactly one request, so a concurrent refresh can never leave a
//! request with a half-updated `Authorization` header.

pub mod details;
pub mod payment;
pub mod status;

pub use details::*;
pub use payment::*;
pub use status::*;

// crates.io
use oauth2::http::{
	Method, Request,
	header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
	request::Builder as RequestBuilder,
};
// self
use crate::{
	_prelude::*,
	auth::Token,
	config::ClientConfig,
	error::{ConfigError, ValidationError},
	http::{self, HttpTransport},
	manager::TokenManager,
	obs::{self, OperationKind, OperationOutcome},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Currency code of every merchant payment (Malagasy ariary).
pub const CURRENCY: &str = "Ar";
/// Value of the `Version` header.
pub const PROTOCOL_VERSION: &str = "1.0";

#[cfg(feature = "reqwest")]
/// Payment façade specialized for the crate's default reqwest transport.
pub type ReqwestTransaction = Transaction<ReqwestHttpClient>;

/// Identifier attached to a request/response pair (`X-CorrelationID` header).
///
/// [`CorrelationId::default`] generates a fresh random UUID.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);
impl CorrelationId {
	/// Generates a random (v4 UUID) identifier.
	pub fn generate() -> Self {
		Self(uuid::Uuid::new_v4().to_string())
	}

	/// Returns the identifier as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	// Placeholder filled in after a response is decoded.
	pub(crate) fn unset() -> Self {
		Self(String::new())
	}
}
impl Default for CorrelationId {
	fn default() -> Self {
		Self::generate()
	}
}
impl From<String> for CorrelationId {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for CorrelationId {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl AsRef<str> for CorrelationId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CorrelationId({})", self.0)
	}
}
impl Display for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Merchant-pay façade bound to a shared [`TokenManager`].
pub struct Transaction<C>
where
	C: ?Sized + HttpTransport,
{
	manager: Arc<TokenManager<C>>,
}
impl<C> Transaction<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a façade that borrows tokens from `manager`.
	pub fn new(manager: Arc<TokenManager<C>>) -> Self {
		Self { manager }
	}

	/// Token manager backing this façade.
	pub fn manager(&self) -> &Arc<TokenManager<C>> {
		&self.manager
	}

	/// Configuration shared with the token manager.
	pub fn config(&self) -> &ClientConfig {
		&self.manager.config
	}

	/// Validates `request`, then submits it to the merchant-pay endpoint.
	///
	/// Validation failures are reported before any token is requested or any request is sent.
	pub async fn initiate_payment(&self, request: PaymentRequest) -> Result<TransactionStatus> {
		const KIND: OperationKind = OperationKind::InitiatePayment;

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = self
			.config()
			.log
			.instrument_op(KIND, "initiate_payment", async {
				request.validate(self.config())?;

				let correlation_id = request.correlation_id.clone().unwrap_or_default();
				let payload = request.payload(&self.config().partner, self.manager.now())?;

				tracing::info!(
					correlation_id = %correlation_id,
					amount = request.amount,
					reference = %request.transaction_reference,
					"initiating payment"
				);

				let body = serde_json::to_vec(&payload).map_err(ConfigError::from)?;
				let token = self.manager.get_token().await?;
				let mut builder = self
					.authorized(Method::POST, self.config().merchant_pay_url([])?, &token, &correlation_id)
					.header(CONTENT_TYPE, "application/json");

				if let Some(callback_url) = &request.callback_url {
					builder = builder.header("X-Callback-URL", callback_url.as_str());
				}

				let response = http::send(
					self.manager.http_client.as_ref(),
					builder.body(body).map_err(ConfigError::from)?,
				)
				.await?;

				TransactionStatus::from_response(&response, correlation_id)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Polls `GET …/status/{server_correlation_id}`.
	pub async fn status(
		&self,
		server_correlation_id: &str,
		correlation_id: Option<CorrelationId>,
	) -> Result<TransactionStatus> {
		const KIND: OperationKind = OperationKind::Status;

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = self
			.config()
			.log
			.instrument_op(KIND, "status", async {
				require("server_correlation_id", server_correlation_id)?;

				let correlation_id = correlation_id.unwrap_or_default();
				let url = self.config().merchant_pay_url(["status", server_correlation_id])?;
				let response = self.get(url, &correlation_id).await?;

				TransactionStatus::from_response(&response, correlation_id)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Fetches `GET …/{transaction_id}`.
	pub async fn details(
		&self,
		transaction_id: &str,
		correlation_id: Option<CorrelationId>,
	) -> Result<TransactionDetails> {
		const KIND: OperationKind = OperationKind::Details;

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = self
			.config()
			.log
			.instrument_op(KIND, "details", async {
				require("transaction_id", transaction_id)?;

				let correlation_id = correlation_id.unwrap_or_default();
				let url = self.config().merchant_pay_url([transaction_id])?;
				let response = self.get(url, &correlation_id).await?;

				TransactionDetails::from_response(&response, correlation_id)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	async fn get(&self, url: Url, correlation_id: &CorrelationId) -> Result<oauth2::HttpResponse> {
		let token = self.manager.get_token().await?;
		let request = self
			.authorized(Method::GET, url, &token, correlation_id)
			.body(Vec::new())
			.map_err(ConfigError::from)?;

		http::send(self.manager.http_client.as_ref(), request).await
	}

	fn authorized(
		&self,
		method: Method,
		url: Url,
		token: &Token,
		correlation_id: &CorrelationId,
	) -> RequestBuilder {
		let partner = &self.config().partner;

		Request::builder()
			.method(method)
			.uri(url.as_str())
			.header(AUTHORIZATION, token.bearer())
			.header("Version", PROTOCOL_VERSION)
			.header("X-CorrelationID", correlation_id.as_str())
			.header("UserLanguage", partner.language.as_str())
			.header(CACHE_CONTROL, "no-cache")
			.header("UserAccountIdentifier", partner.account_identifier())
			.header("partnerName", partner.name.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl Transaction<ReqwestHttpClient> {
	/// Creates a façade and its token manager backed by a default reqwest client.
	pub fn from_config(config: ClientConfig) -> Self {
		Self::new(Arc::new(TokenManager::new(config)))
	}
}
impl<C> Clone for Transaction<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { manager: Arc::clone(&self.manager) }
	}
}
impl<C> Debug for Transaction<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Transaction").field("manager", &self.manager).finish()
	}
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() { Err(ValidationError::MissingField { field }) } else { Ok(()) }
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::Method;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		config::{ClientConfig, Environment},
		obs::LogHandle,
	};

	const MERCHANT_PAY: &str = "https://devapi.mvola.mg/mvola/mm/transactions/type/merchantpay/1.0.0";

	fn transaction() -> (Transaction<ScriptedTransport>, ScriptedTransport) {
		let (manager, transport, _clock) = scripted_manager(sandbox_config());

		(Transaction::new(Arc::new(manager)), transport)
	}

	fn payment() -> PaymentRequest {
		PaymentRequest::new(2000, DEBIT_NUMBER, CREDIT_NUMBER, "ref-001").description("Test payment")
	}

	#[tokio::test]
	async fn initiate_payment_sends_headers_and_payload() {
		let (transaction, transport) = transaction();

		transport.push(200, token_body("t1", 3600)).push(
			202,
			"{\"status\":\"pending\",\"serverCorrelationId\":\"srv-1\",\"notificationMethod\":\"polling\"}",
		);

		let status = transaction
			.initiate_payment(
				payment()
					.correlation_id("corr-1")
					.callback_url(Url::parse("https://shop.example.com/hook").expect("Callback should parse."))
					.metadata("fc", "USD"),
			)
			.await
			.expect("Payment initiation should succeed.");

		assert!(status.is_pending());
		assert_eq!(status.server_correlation_id.as_deref(), Some("srv-1"));
		assert_eq!(status.client_correlation_id.as_str(), "corr-1");

		let requests = transport.requests();
		let request = requests.get(1).expect("Payment request should be recorded.");

		assert_eq!(request.method, Method::POST);
		assert_eq!(request.uri, MERCHANT_PAY);
		assert_eq!(request.header("authorization"), Some("Bearer t1"));
		assert_eq!(request.header("version"), Some("1.0"));
		assert_eq!(request.header("x-correlationid"), Some("corr-1"));
		assert_eq!(request.header("userlanguage"), Some("FR"));
		assert_eq!(request.header("cache-control"), Some("no-cache"));
		assert_eq!(request.header("useraccountidentifier"), Some("msisdn;0343500003"));
		assert_eq!(request.header("partnername"), Some("Acme Shop"));
		assert_eq!(request.header("x-callback-url"), Some("https://shop.example.com/hook"));
		assert_eq!(request.header("content-type"), Some("application/json"));

		let body = request.body_json();

		assert_eq!(body["amount"], "2000");
		assert_eq!(body["currency"], "Ar");
		assert_eq!(body["descriptionText"], "Test payment");
		assert_eq!(body["requestDate"], "2025-02-23T12:00:00.000Z");
		assert_eq!(body["requestingOrganisationTransactionReference"], "ref-001");
		assert_eq!(body["originalTransactionReference"], "ref-001");
		assert_eq!(body["debitParty"][0]["key"], "msisdn");
		assert_eq!(body["debitParty"][0]["value"], DEBIT_NUMBER);
		assert_eq!(body["creditParty"][0]["value"], CREDIT_NUMBER);
		assert_eq!(body["metadata"][0]["key"], "partnerName");
		assert_eq!(body["metadata"][0]["value"], "Acme Shop");
		assert_eq!(body["metadata"][1]["key"], "fc");
	}

	#[tokio::test]
	async fn invalid_description_fails_before_any_request() {
		let (transaction, transport) = transaction();
		let err = transaction
			.initiate_payment(payment().description("Test $$$"))
			.await
			.expect_err("Dollar signs should be rejected.");

		assert!(matches!(
			err,
			Error::Validation(ValidationError::DescriptionCharacter { character: '$' })
		));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn sandbox_rejects_unknown_debit_number() {
		let (transaction, transport) = transaction();
		let err = transaction
			.initiate_payment(PaymentRequest::new(2000, "0341234567", CREDIT_NUMBER, "ref-002"))
			.await
			.expect_err("Sandbox should reject non test numbers.");

		assert!(matches!(err, Error::Validation(ValidationError::SandboxPhoneNumber { .. })));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn status_and_details_hit_their_paths() {
		let (transaction, transport) = transaction();

		transport
			.push(200, token_body("t1", 3600))
			.push(200, "{\"status\":\"completed\",\"serverCorrelationId\":\"srv-1\",\"objectReference\":\"653805064\"}")
			.push(200, "{\"transactionStatus\":\"failed\",\"transactionReference\":\"653805064\"}");

		let status = transaction.status("srv-1", None).await.expect("Status should succeed.");

		assert!(status.is_completed());
		assert_eq!(status.transaction_reference.as_deref(), Some("653805064"));

		let details = transaction
			.details("653805064", Some("corr-9".into()))
			.await
			.expect("Details should succeed.");

		assert!(details.is_failed());
		assert_eq!(details.client_correlation_id.as_str(), "corr-9");

		let requests = transport.requests();

		assert_eq!(requests[1].method, Method::GET);
		assert_eq!(requests[1].uri, format!("{MERCHANT_PAY}/status/srv-1"));
		assert!(requests[1].header("x-callback-url").is_none());
		assert!(!requests[1].header("x-correlationid").unwrap_or_default().is_empty());
		assert_eq!(requests[2].uri, format!("{MERCHANT_PAY}/653805064"));
		assert_eq!(requests[2].header("x-correlationid"), Some("corr-9"));
		assert_eq!(transport.calls_to("/token"), 1);
	}

	#[tokio::test]
	async fn empty_identifiers_are_rejected_locally() {
		let (transaction, transport) = transaction();

		assert!(matches!(
			transaction.status(" ", None).await,
			Err(Error::Validation(ValidationError::MissingField { field: "server_correlation_id" }))
		));
		assert!(matches!(
			transaction.details("", None).await,
			Err(Error::Validation(ValidationError::MissingField { field: "transaction_id" }))
		));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn rejected_bearer_surfaces_unauthorized() {
		let (transaction, transport) = transaction();

		transport
			.push(200, token_body("t1", 3600))
			.push(401, "{\"fault\":\"Invalid Credentials\"}")
			.push(200, token_body("t2", 3600))
			.push(200, "{\"status\":\"pending\"}");

		let err = transaction.status("srv-1", None).await.expect_err("401 should surface.");

		assert!(matches!(err, Error::Unauthorized { .. }));

		transaction.manager().force_refresh().await.expect("Forced refresh should succeed.");

		let status = transaction.status("srv-1", None).await.expect("Retry should succeed.");

		assert!(status.is_pending());
		assert_eq!(transport.requests()[3].header("authorization"), Some("Bearer t2"));
	}

	#[tokio::test]
	async fn user_language_header_follows_config() {
		let config = ClientConfig::builder(CONSUMER_KEY, CONSUMER_SECRET)
			.partner("Acme Shop", DEBIT_NUMBER)
			.environment(Environment::Production)
			.user_language("mg")
			.log_handle(LogHandle::none())
			.build()
			.expect("Production configuration should build.");
		let (manager, transport, _clock) = scripted_manager(config);
		let transaction = Transaction::new(Arc::new(manager));

		transport.push(200, token_body("t1", 3600)).push(200, "{}");
		transaction.status("srv-1", None).await.expect("Status should succeed.");

		assert_eq!(transport.requests()[1].header("userlanguage"), Some("MG"));
		assert!(transport.requests()[1].uri.starts_with("https://api.mvola.mg/"));
	}

	#[tokio::test]
	async fn rejected_input_still_runs_inside_the_operation_span() {
		let subscriber = CountingSubscriber::default();
		let config = ClientConfig::builder(CONSUMER_KEY, CONSUMER_SECRET)
			.partner("Acme Shop", DEBIT_NUMBER)
			.environment(Environment::Sandbox)
			.log_handle(LogHandle::with_dispatch(subscriber.clone()))
			.build()
			.expect("Sandbox configuration should build.");
		let (manager, transport, _clock) = scripted_manager(config);
		let transaction = Transaction::new(Arc::new(manager));

		transaction
			.initiate_payment(payment().description("Test $$$"))
			.await
			.expect_err("Dollar signs should be rejected.");
		transaction.status("", None).await.expect_err("Empty id should be rejected.");
		transaction.details("", None).await.expect_err("Empty id should be rejected.");

		assert_eq!(subscriber.spans(), 3);
		assert!(transport.requests().is_empty());
	}

	#[cfg(feature = "metrics")]
	mod outcome_metrics {
		// std
		use std::{
			collections::HashMap,
			sync::atomic::{AtomicU64, Ordering},
		};
		// crates.io
		use metrics::{
			Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString,
			Unit,
		};
		// self
		use super::*;

		#[derive(Default)]
		struct OutcomeCounter(AtomicU64);
		impl CounterFn for OutcomeCounter {
			fn increment(&self, value: u64) {
				self.0.fetch_add(value, Ordering::SeqCst);
			}

			fn absolute(&self, value: u64) {
				self.0.fetch_max(value, Ordering::SeqCst);
			}
		}

		#[derive(Default)]
		struct OutcomeRecorder {
			counters: Mutex<HashMap<String, Arc<OutcomeCounter>>>,
		}
		impl OutcomeRecorder {
			fn count(&self, operation: &str, outcome: &str) -> u64 {
				self.counters
					.lock()
					.get(&format!("operation={operation},outcome={outcome}"))
					.map_or(0, |counter| counter.0.load(Ordering::SeqCst))
			}
		}
		impl Recorder for OutcomeRecorder {
			fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

			fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

			fn describe_histogram(
				&self,
				_key: KeyName,
				_unit: Option<Unit>,
				_description: SharedString,
			) {
			}

			fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
				let labels = key
					.labels()
					.map(|label| format!("{}={}", label.key(), label.value()))
					.collect::<Vec<_>>()
					.join(",");
				let counter = self.counters.lock().entry(labels).or_default().clone();

				Counter::from_arc(counter)
			}

			fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
				Gauge::noop()
			}

			fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
				Histogram::noop()
			}
		}

		#[test]
		fn rejected_input_counts_as_failed_attempts() {
			let recorder = OutcomeRecorder::default();
			let (transaction, transport) = transaction();

			metrics::with_local_recorder(&recorder, || {
				tokio::runtime::Builder::new_current_thread()
					.build()
					.expect("Test runtime should build.")
					.block_on(async {
						transaction
							.initiate_payment(payment().description("Test $$$"))
							.await
							.expect_err("Dollar signs should be rejected.");
						transaction.status(" ", None).await.expect_err("Blank id should be rejected.");
					})
			});

			assert_eq!(recorder.count("initiate_payment", "attempt"), 1);
			assert_eq!(recorder.count("initiate_payment", "failure"), 1);
			assert_eq!(recorder.count("status", "attempt"), 1);
			assert_eq!(recorder.count("status", "failure"), 1);
			assert!(transport.requests().is_empty());
		}
	}
}
