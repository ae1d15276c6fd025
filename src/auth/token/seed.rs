//! Tokens supplied by the caller when the manager is constructed.

// self
use crate::{
	_prelude::*,
	auth::token::record::{Token, TokenBuilderError},
};

/// Field mapping form of a seed token, e.g. restored from a JSON cache entry.
///
/// Exactly one of `expires_at` (string timestamp) or `expires_in` (seconds counted from the
/// moment the manager adopts the token) is expected; `expires_at` wins when both are present.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
	/// Bearer value.
	pub access_token: String,
	/// Token type, usually `Bearer`.
	#[serde(default)]
	pub token_type: String,
	/// Granted scope.
	#[serde(default)]
	pub scope: String,
	/// Absolute expiry as RFC 3339 or `YYYY-MM-DD HH:MM:SS +HHMM`.
	#[serde(default)]
	pub expires_at: Option<String>,
	/// Relative lifetime in seconds.
	#[serde(default)]
	pub expires_in: Option<i64>,
}
impl Debug for RawToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RawToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("expires_at", &self.expires_at)
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// Pre-existing token handed to [`TokenManager::with_token`](crate::manager::TokenManager::with_token).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeedToken {
	/// Fully built token carrying an absolute expiry.
	Built(Token),
	/// Raw fields that still need expiry resolution.
	Raw(RawToken),
}
impl SeedToken {
	/// Resolves the seed into a [`Token`], counting relative expiries from `now`.
	pub fn resolve(self, now: OffsetDateTime) -> Result<Token, TokenBuilderError> {
		match self {
			Self::Built(token) => Ok(token),
			Self::Raw(raw) => {
				let mut builder = Token::builder(raw.access_token)
					.token_type(raw.token_type)
					.scope(raw.scope)
					.issued_at(now);

				if let Some(expires_at) = raw.expires_at {
					builder = builder.expires_at_str(expires_at);
				}
				if let Some(expires_in) = raw.expires_in {
					builder = builder.expires_in(Duration::seconds(expires_in));
				}

				builder.build()
			},
		}
	}
}
impl From<Token> for SeedToken {
	fn from(token: Token) -> Self {
		Self::Built(token)
	}
}
impl From<RawToken> for SeedToken {
	fn from(raw: RawToken) -> Self {
		Self::Raw(raw)
	}
}
