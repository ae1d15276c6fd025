//! Settled transaction details.

// crates.io
use oauth2::HttpResponse;
// self
use crate::{
	_prelude::*,
	http,
	transaction::{CorrelationId, KeyValue},
};

/// Fee charged on a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
	/// Fee amount as formatted by the API.
	#[serde(default)]
	pub fee_amount: Option<String>,
}

/// Details of a transaction looked up by its id.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
	/// Amount as formatted by the API (e.g. `10000.00`).
	#[serde(default)]
	pub amount: Option<String>,
	/// Currency code.
	#[serde(default)]
	pub currency: Option<String>,
	/// Date of the initiating request.
	#[serde(default)]
	pub request_date: Option<String>,
	/// Debited party identifiers.
	#[serde(default)]
	pub debit_party: Vec<KeyValue>,
	/// Credited party identifiers.
	#[serde(default)]
	pub credit_party: Vec<KeyValue>,
	/// Fees charged.
	#[serde(default)]
	pub fees: Vec<Fee>,
	/// Metadata echoed or added by the API.
	#[serde(default)]
	pub metadata: Vec<KeyValue>,
	/// `completed` or `failed`.
	#[serde(default)]
	pub transaction_status: Option<String>,
	/// Date the transaction was created.
	#[serde(default)]
	pub creation_date: Option<String>,
	/// Transaction id.
	#[serde(default)]
	pub transaction_reference: Option<String>,
	/// Correlation id sent with the request.
	#[serde(skip_deserializing, default = "CorrelationId::unset")]
	pub client_correlation_id: CorrelationId,
	/// Undecoded response body.
	#[serde(skip_deserializing)]
	pub raw: serde_json::Value,
}
impl TransactionDetails {
	pub(crate) fn from_response(
		response: &HttpResponse,
		client_correlation_id: CorrelationId,
	) -> Result<Self> {
		let (mut details, raw): (Self, _) = http::decode_json_with_raw(response)?;

		details.raw = raw;
		details.client_correlation_id = client_correlation_id;

		Ok(details)
	}

	/// The transaction went through.
	pub fn is_completed(&self) -> bool {
		self.transaction_status.as_deref() == Some("completed")
	}

	/// The transaction failed.
	pub fn is_failed(&self) -> bool {
		self.transaction_status.as_deref() == Some("failed")
	}

	/// MSISDN of the debited party, if listed.
	pub fn debit_msisdn(&self) -> Option<&str> {
		msisdn(&self.debit_party)
	}

	/// MSISDN of the credited party, if listed.
	pub fn credit_msisdn(&self) -> Option<&str> {
		msisdn(&self.credit_party)
	}
}

fn msisdn(party: &[KeyValue]) -> Option<&str> {
	party.iter().find(|entry| entry.key == "msisdn").map(|entry| entry.value.as_str())
}
