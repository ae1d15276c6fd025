//! Payment status returned by initiation and status polling.

// crates.io
use oauth2::HttpResponse;
// self
use crate::{_prelude::*, http, transaction::CorrelationId};

const PENDING: &str = "pending";
const COMPLETED: &str = "completed";
const FAILED: &str = "failed";

/// State of a payment as reported by the API.
///
/// Unknown fields are kept in [`raw`](Self::raw).
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
	/// `pending`, `completed`, or `failed`.
	#[serde(default)]
	pub status: Option<String>,
	/// Server-side id used to poll the status.
	#[serde(default)]
	pub server_correlation_id: Option<String>,
	/// `polling` or `callback`.
	#[serde(default)]
	pub notification_method: Option<String>,
	/// Transaction id once the payment settled (`objectReference`).
	#[serde(default, rename = "objectReference")]
	pub transaction_reference: Option<String>,
	/// Correlation id sent with the request.
	#[serde(skip_deserializing, default = "CorrelationId::unset")]
	pub client_correlation_id: CorrelationId,
	/// Undecoded response body.
	#[serde(skip_deserializing)]
	pub raw: serde_json::Value,
}
impl TransactionStatus {
	pub(crate) fn from_response(
		response: &HttpResponse,
		client_correlation_id: CorrelationId,
	) -> Result<Self> {
		let (mut status, raw): (Self, _) = http::decode_json_with_raw(response)?;

		status.raw = raw;
		status.client_correlation_id = client_correlation_id;

		Ok(status)
	}

	/// The payment awaits customer confirmation.
	pub fn is_pending(&self) -> bool {
		self.status.as_deref() == Some(PENDING)
	}

	/// The payment went through.
	pub fn is_completed(&self) -> bool {
		self.status.as_deref() == Some(COMPLETED)
	}

	/// The payment was refused or timed out.
	pub fn is_failed(&self) -> bool {
		self.status.as_deref() == Some(FAILED)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::StatusCode;
	// self
	use super::*;

	fn response(body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = StatusCode::ACCEPTED;

		response
	}

	#[test]
	fn decodes_known_fields_and_keeps_raw_body() {
		let status = TransactionStatus::from_response(
			&response(
				"{\"status\":\"pending\",\"serverCorrelationId\":\"srv-1\",\"notificationMethod\":\"polling\",\"extra\":1}",
			),
			"corr-1".into(),
		)
		.expect("Status body should decode.");

		assert!(status.is_pending());
		assert!(!status.is_completed());
		assert!(!status.is_failed());
		assert_eq!(status.notification_method.as_deref(), Some("polling"));
		assert_eq!(status.raw["extra"], 1);
		assert_eq!(status.client_correlation_id.as_str(), "corr-1");
	}

	#[test]
	fn missing_fields_are_none() {
		let status = TransactionStatus::from_response(&response("{}"), CorrelationId::default())
			.expect("Empty object should decode.");

		assert!(status.status.is_none());
		assert!(!status.is_pending());
		assert!(status.transaction_reference.is_none());
	}

	#[test]
	fn wrong_types_are_decode_errors() {
		let err = TransactionStatus::from_response(&response("{\"status\":3}"), "c".into())
			.expect_err("Numeric status should fail.");

		assert!(matches!(err, Error::Decode { status: 202, .. }));
	}
}
