//! Merchant payment requests and their local validation.

// crates.io
use time::{UtcOffset, format_description::BorrowedFormatItem, macros};
// self
use crate::{
	_prelude::*,
	auth::Partner,
	config::{self, ClientConfig},
	error::{ConfigError, ValidationError},
	transaction::{CURRENCY, CorrelationId},
};

/// Longest description the API accepts, in characters.
pub const DESCRIPTION_MAX_LEN: usize = 50;

const DESCRIPTION_PUNCTUATION: [char; 4] = ['-', '.', '_', ','];
const MSISDN_KEY: &str = "msisdn";
const PARTNER_NAME_KEY: &str = "partnerName";
const REQUEST_DATE_FORMAT: &[BorrowedFormatItem<'_>] = macros::format_description!(
	"[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

/// Key/value pair used by party lists and metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
	/// Entry name.
	pub key: String,
	/// Entry value.
	pub value: String,
}
impl KeyValue {
	/// Creates a new pair.
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self { key: key.into(), value: value.into() }
	}
}

/// A merchant payment to initiate.
///
/// Amounts are whole ariary. The customer (`debit_phone_number`) pays the merchant
/// (`credit_phone_number`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
	/// Amount in ariary; must be greater than zero.
	pub amount: u64,
	/// Customer MSISDN.
	pub debit_phone_number: String,
	/// Merchant MSISDN.
	pub credit_phone_number: String,
	/// Merchant-side reference of the payment.
	pub transaction_reference: String,
	/// Reference of the original payment; defaults to `transaction_reference`.
	pub original_transaction_reference: Option<String>,
	/// Free text shown to the customer.
	pub description: String,
	/// Correlation id to send; a random one is generated when absent.
	pub correlation_id: Option<CorrelationId>,
	/// URL the API notifies once the payment settles (`X-Callback-URL`).
	pub callback_url: Option<Url>,
	/// Extra metadata appended after the partner name.
	pub metadata: Vec<KeyValue>,
}
impl PaymentRequest {
	/// Creates a request with an empty description and no optional fields.
	pub fn new(
		amount: u64,
		debit_phone_number: impl Into<String>,
		credit_phone_number: impl Into<String>,
		transaction_reference: impl Into<String>,
	) -> Self {
		Self {
			amount,
			debit_phone_number: debit_phone_number.into(),
			credit_phone_number: credit_phone_number.into(),
			transaction_reference: transaction_reference.into(),
			original_transaction_reference: None,
			description: String::new(),
			correlation_id: None,
			callback_url: None,
			metadata: Vec::new(),
		}
	}

	/// Sets the description text.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();

		self
	}

	/// Sets the original transaction reference.
	pub fn original_transaction_reference(mut self, reference: impl Into<String>) -> Self {
		self.original_transaction_reference = Some(reference.into());

		self
	}

	/// Sets the correlation id.
	pub fn correlation_id(mut self, correlation_id: impl Into<CorrelationId>) -> Self {
		self.correlation_id = Some(correlation_id.into());

		self
	}

	/// Sets the callback URL.
	pub fn callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Appends a metadata entry.
	pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.metadata.push(KeyValue::new(key, value));

		self
	}

	/// Checks the request against the API's input rules for the configured environment.
	///
	/// Checks run in order: amount, reference, phone number format, sandbox test numbers,
	/// description. The first failure is returned.
	pub fn validate(&self, config: &ClientConfig) -> Result<(), ValidationError> {
		if self.amount == 0 {
			return Err(ValidationError::NonPositiveAmount);
		}
		if self.transaction_reference.trim().is_empty() {
			return Err(ValidationError::MissingField { field: "transaction_reference" });
		}

		let parties = [
			("debit phone number", self.debit_phone_number.as_str()),
			("credit phone number", self.credit_phone_number.as_str()),
		];

		for (field, number) in parties {
			if !is_msisdn(number) {
				return Err(ValidationError::InvalidPhoneNumber { field, number: number.to_owned() });
			}
		}
		if config.is_sandbox() {
			for (field, number) in parties {
				if !config::is_sandbox_phone_number(number) {
					return Err(ValidationError::SandboxPhoneNumber {
						field,
						number: number.to_owned(),
					});
				}
			}
		}

		validate_description(&self.description)
	}

	pub(crate) fn payload<'a>(
		&'a self,
		partner: &'a Partner,
		now: OffsetDateTime,
	) -> Result<PaymentPayload<'a>, ConfigError> {
		let mut metadata = Vec::with_capacity(self.metadata.len() + 1);

		metadata.push(KeyValue::new(PARTNER_NAME_KEY, partner.name.as_str()));
		metadata.extend(self.metadata.iter().cloned());

		Ok(PaymentPayload {
			amount: self.amount.to_string(),
			currency: CURRENCY,
			description_text: &self.description,
			request_date: now.to_offset(UtcOffset::UTC).format(REQUEST_DATE_FORMAT)?,
			requesting_organisation_transaction_reference: &self.transaction_reference,
			original_transaction_reference: self
				.original_transaction_reference
				.as_deref()
				.unwrap_or(&self.transaction_reference),
			debit_party: [KeyValue::new(MSISDN_KEY, self.debit_phone_number.as_str())],
			credit_party: [KeyValue::new(MSISDN_KEY, self.credit_phone_number.as_str())],
			metadata,
		})
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentPayload<'a> {
	amount: String,
	currency: &'static str,
	description_text: &'a str,
	request_date: String,
	requesting_organisation_transaction_reference: &'a str,
	original_transaction_reference: &'a str,
	debit_party: [KeyValue; 1],
	credit_party: [KeyValue; 1],
	metadata: Vec<KeyValue>,
}

/// Returns `true` for ten ASCII digits starting with `03`.
pub fn is_msisdn(number: &str) -> bool {
	number.len() == 10 && number.starts_with("03") && number.bytes().all(|b| b.is_ascii_digit())
}

/// Checks the description length and character set.
///
/// Letters (accented ones included), digits, whitespace, and `- . _ ,` are accepted.
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
	let len = description.chars().count();

	if len > DESCRIPTION_MAX_LEN {
		return Err(ValidationError::DescriptionTooLong { len, max: DESCRIPTION_MAX_LEN });
	}
	if let Some(character) = description.chars().find(|c| {
		!(c.is_alphanumeric() || c.is_whitespace() || DESCRIPTION_PUNCTUATION.contains(c))
	}) {
		return Err(ValidationError::DescriptionCharacter { character });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		config::{ClientConfig, Environment},
		obs::LogHandle,
	};

	fn production_config() -> ClientConfig {
		ClientConfig::builder(CONSUMER_KEY, CONSUMER_SECRET)
			.partner("Acme Shop", "0341234567")
			.environment(Environment::Production)
			.log_handle(LogHandle::none())
			.build()
			.expect("Production configuration should build.")
	}

	#[test]
	fn descriptions_follow_the_character_rules() {
		assert!(validate_description("").is_ok());
		assert!(validate_description("Paiement café, n°1").is_err());
		assert!(validate_description("Paiement café - facture_12.3, merci").is_ok());
		assert_eq!(
			validate_description("Test $$$"),
			Err(ValidationError::DescriptionCharacter { character: '$' })
		);
		assert_eq!(validate_description(&"a".repeat(50)), Ok(()));
		assert_eq!(
			validate_description(&"é".repeat(51)),
			Err(ValidationError::DescriptionTooLong { len: 51, max: 50 })
		);
	}

	#[test]
	fn msisdn_format_is_checked() {
		assert!(is_msisdn("0343500003"));
		assert!(is_msisdn("0331234567"));
		assert!(!is_msisdn(""));
		assert!(!is_msisdn("343500003"));
		assert!(!is_msisdn("0443500003"));
		assert!(!is_msisdn("03435000a3"));
		assert!(!is_msisdn("+261343500003"));
	}

	#[test]
	fn validation_order_is_stable() {
		let config = sandbox_config();

		assert_eq!(
			PaymentRequest::new(0, "bad", "bad", "").description("$").validate(&config),
			Err(ValidationError::NonPositiveAmount)
		);
		assert_eq!(
			PaymentRequest::new(1, "bad", "bad", " ").validate(&config),
			Err(ValidationError::MissingField { field: "transaction_reference" })
		);
		assert_eq!(
			PaymentRequest::new(1, "", CREDIT_NUMBER, "ref").validate(&config),
			Err(ValidationError::InvalidPhoneNumber {
				field: "debit phone number",
				number: String::new()
			})
		);
		assert_eq!(
			PaymentRequest::new(1, DEBIT_NUMBER, "0341234567", "ref").validate(&config),
			Err(ValidationError::SandboxPhoneNumber {
				field: "credit phone number",
				number: "0341234567".into()
			})
		);
		assert_eq!(
			PaymentRequest::new(1, DEBIT_NUMBER, CREDIT_NUMBER, "ref")
				.description("Test $$$")
				.validate(&config),
			Err(ValidationError::DescriptionCharacter { character: '$' })
		);
	}

	#[test]
	fn production_accepts_any_well_formed_number() {
		let request = PaymentRequest::new(1500, "0341234567", "0349876543", "ref-42");

		assert_eq!(request.validate(&production_config()), Ok(()));
		assert!(matches!(
			request.validate(&sandbox_config()),
			Err(ValidationError::SandboxPhoneNumber { field: "debit phone number", .. })
		));
	}

	#[test]
	fn request_date_is_utc_with_millisecond_precision() {
		let partner = sandbox_config().partner;
		let request = PaymentRequest::new(1, DEBIT_NUMBER, CREDIT_NUMBER, "ref");
		let date = |now| {
			request.payload(&partner, now).expect("Request date should format.").request_date
		};

		assert_eq!(date(macros::datetime!(2025-02-23 00:00 UTC)), "2025-02-23T00:00:00.000Z");
		assert_eq!(
			date(macros::datetime!(2025-03-01 01:02:03.004999 +04:00)),
			"2025-02-28T21:02:03.004Z"
		);
	}

	#[test]
	fn payload_uses_api_field_names() {
		let partner = sandbox_config().partner;
		let request = PaymentRequest::new(2000, DEBIT_NUMBER, CREDIT_NUMBER, "ref-001")
			.description("Order 17")
			.original_transaction_reference("ref-000")
			.metadata("fc", "USD");
		let now = macros::datetime!(2025-02-23 15:04:05.678 +03:00);
		let payload = serde_json::to_value(
			request.payload(&partner, now).expect("Request date should format."),
		)
		.expect("Payload should serialize.");

		assert_eq!(
			payload,
			serde_json::json!({
				"amount": "2000",
				"currency": "Ar",
				"descriptionText": "Order 17",
				"requestDate": "2025-02-23T12:04:05.678Z",
				"requestingOrganisationTransactionReference": "ref-001",
				"originalTransactionReference": "ref-000",
				"debitParty": [{ "key": "msisdn", "value": DEBIT_NUMBER }],
				"creditParty": [{ "key": "msisdn", "value": CREDIT_NUMBER }],
				"metadata": [
					{ "key": "partnerName", "value": "Acme Shop" },
					{ "key": "fc", "value": "USD" }
				]
			})
		);
	}
}
