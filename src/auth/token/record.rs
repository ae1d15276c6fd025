//! Immutable access token value, expiry predicate, and builder.

// crates.io
use time::{format_description::well_known::Rfc3339, macros};
// self
use crate::{_prelude::*, auth::token::secret::Secret};

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when a string expiry could not be parsed.
	#[error("Expiry timestamp `{value}` is not RFC 3339 nor `YYYY-MM-DD HH:MM:SS +HHMM`.")]
	InvalidExpiry {
		/// Raw timestamp that failed to parse.
		value: String,
	},
	/// Issued when the issued instant plus the lifetime is not a representable date.
	#[error("Expiry is outside the supported date range.")]
	ExpiryOutOfRange,
}

/// Access token issued by the MVola token endpoint.
///
/// Two tokens with identical fields compare equal. A token is considered valid until
/// [`Token::EXPIRY_MARGIN`] before its `expires_at` instant so requests never race the hard
/// expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
	/// Bearer value; callers must avoid logging it.
	pub access_token: Secret,
	/// Token type reported by the server (usually `Bearer`).
	pub token_type: String,
	/// Scope granted by the server.
	pub scope: String,
	/// Absolute expiry instant.
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Safety margin subtracted from `expires_at` when checking validity.
	pub const EXPIRY_MARGIN: Duration = Duration::minutes(5);

	/// Returns a builder for the provided access token value.
	pub fn builder(access_token: impl Into<String>) -> TokenBuilder {
		TokenBuilder::new(access_token)
	}

	/// Returns `true` while `instant` is strictly before `expires_at - EXPIRY_MARGIN`.
	///
	/// A token whose margin falls before the earliest representable date is stale.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		self.refresh_deadline().is_some_and(|deadline| instant < deadline)
	}

	/// Convenience helper that checks validity against the current UTC instant.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}

	/// Time left before the token stops being valid; zero once stale.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		match self.refresh_deadline() {
			Some(deadline) if deadline > instant => deadline - instant,
			_ => Duration::ZERO,
		}
	}

	/// Value of the `Authorization` header for protected calls.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.access_token.expose())
	}

	fn refresh_deadline(&self) -> Option<OffsetDateTime> {
		self.expires_at.checked_sub(Self::EXPIRY_MARGIN)
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Token`].
#[derive(Clone, Debug)]
pub struct TokenBuilder {
	access_token: Secret,
	token_type: String,
	scope: String,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_at_raw: Option<String>,
	expires_in: Option<Duration>,
}
impl TokenBuilder {
	fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: Secret::new(access_token),
			token_type: String::new(),
			scope: String::new(),
			issued_at: None,
			expires_at: None,
			expires_at_raw: None,
			expires_in: None,
		}
	}

	/// Sets the token type.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = token_type.into();

		self
	}

	/// Sets the granted scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// Sets the instant a relative `expires_in` counts from (defaults to now).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets an absolute expiry from a string timestamp, parsed at [`build`](Self::build).
	pub fn expires_at_str(mut self, raw: impl Into<String>) -> Self {
		self.expires_at_raw = Some(raw.into());

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuilderError> {
		if self.access_token.is_blank() {
			return Err(TokenBuilderError::MissingAccessToken);
		}

		let parsed = self.expires_at_raw.as_deref().map(parse_timestamp).transpose()?;
		let expires_at = match (self.expires_at.or(parsed), self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => self
				.issued_at
				.unwrap_or_else(OffsetDateTime::now_utc)
				.checked_add(delta)
				.ok_or(TokenBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(TokenBuilderError::MissingExpiry),
		};

		Ok(Token {
			access_token: self.access_token,
			token_type: self.token_type,
			scope: self.scope,
			expires_at,
		})
	}
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, TokenBuilderError> {
	let raw = raw.trim();

	OffsetDateTime::parse(raw, &Rfc3339)
		.or_else(|_| {
			OffsetDateTime::parse(
				raw,
				macros::format_description!(
					"[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
				),
			)
		})
		.map_err(|_| TokenBuilderError::InvalidExpiry { value: raw.to_owned() })
}
