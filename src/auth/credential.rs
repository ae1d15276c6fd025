//! Consumer credentials and the partner identity announced on every payment call.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::token::secret::Secret, config::UserLanguage};

/// Consumer key/secret pair issued by the MVola developer portal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
	/// Consumer key (client identifier).
	pub consumer_key: String,
	/// Consumer secret; never logged.
	pub consumer_secret: Secret,
}
impl Credential {
	/// Creates a credential pair.
	pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
		Self { consumer_key: consumer_key.into(), consumer_secret: Secret::new(consumer_secret) }
	}

	/// `Authorization` header value for the token endpoint: `Basic base64(key:secret)`.
	pub fn basic_authorization(&self) -> String {
		let raw = format!("{}:{}", self.consumer_key, self.consumer_secret.expose());

		format!("Basic {}", STANDARD.encode(raw))
	}
}

/// Merchant identity attached to payment requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partner {
	/// Display name sent in the `partnerName` header and payment metadata.
	pub name: String,
	/// Merchant MSISDN used in the `UserAccountIdentifier` header.
	pub phone_number: String,
	/// Language for user-facing messages.
	pub language: UserLanguage,
}
impl Partner {
	/// `UserAccountIdentifier` header value.
	pub fn account_identifier(&self) -> String {
		format!("msisdn;{}", self.phone_number)
	}
}
