//! Client-level error types shared by the token manager and the payment façade.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Caller-supplied payment input was rejected before any network call.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The API rejected the credentials or the bearer token (HTTP 401).
	///
	/// Callers that suspect a revoked token may call
	/// [`TokenManager::force_refresh`](crate::manager::TokenManager::force_refresh) and retry.
	#[error("Request was rejected as unauthorized: {body}.")]
	Unauthorized {
		/// Raw response body.
		body: String,
	},
	/// The API answered with any other non-success status.
	#[error("Request failed with HTTP status {status}: {body}.")]
	InvalidRequest {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// A success response carried JSON that does not match the expected shape.
	#[error("Response with HTTP status {status} could not be decoded.")]
	Decode {
		/// Structured parsing failure naming the offending field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
}

/// Configuration failures raised at construction time or while preparing a request.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Request payload could not be serialized.
	#[error("Request body could not be encoded.")]
	Encode(#[from] serde_json::Error),
	/// A request timestamp could not be formatted.
	#[error("Request timestamp could not be formatted.")]
	TimestampFormat(#[from] time::error::Format),

	/// A required credential or partner field is empty.
	#[error("The `{field}` setting is required.")]
	MissingField {
		/// Name of the missing setting.
		field: &'static str,
	},
	/// The partner phone number is not usable against the sandbox.
	#[error("The {field} `{number}` is not one of the sandbox test numbers.")]
	SandboxPhoneNumber {
		/// Which setting carried the number.
		field: &'static str,
		/// Offending phone number.
		number: String,
	},
	/// The base URL cannot carry path segments.
	#[error("Base URL `{url}` must be an absolute http(s) URL.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Seed token could not be turned into a [`Token`](crate::auth::Token).
	#[error("Unable to build token.")]
	TokenBuild(#[from] crate::auth::TokenBuilderError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Payment input rejected before the request leaves the process.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Amount must be strictly positive.
	#[error("Payment amount must be greater than zero.")]
	NonPositiveAmount,
	/// A phone number does not look like an MVola MSISDN.
	#[error("The {field} `{number}` is not a valid MVola phone number.")]
	InvalidPhoneNumber {
		/// Which input carried the number.
		field: &'static str,
		/// Offending phone number.
		number: String,
	},
	/// A phone number is not one of the sandbox test numbers.
	#[error("The {field} `{number}` is not one of the sandbox test numbers.")]
	SandboxPhoneNumber {
		/// Which input carried the number.
		field: &'static str,
		/// Offending phone number.
		number: String,
	},
	/// Description exceeds the API's length limit.
	#[error("Description is {len} characters long; the limit is {max}.")]
	DescriptionTooLong {
		/// Actual character count.
		len: usize,
		/// Maximum accepted character count.
		max: usize,
	},
	/// Description contains a character the API refuses.
	#[error("Description contains the unsupported character `{character}`.")]
	DescriptionCharacter {
		/// First offending character.
		character: char,
	},
	/// A required payment field is empty.
	#[error("The `{field}` payment field is required.")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the MVola API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the MVola API.")]
	Io(#[from] std::io::Error),
	/// Transport failed without a structured error.
	#[error("HTTP client error occurred while calling the MVola API: {message}.")]
	Other {
		/// Transport-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn http_errors_render_raw_body() {
		let err = Error::InvalidRequest { status: 400, body: "{\"errorCode\":\"4001\"}".into() };

		assert_eq!(err.to_string(), "Request failed with HTTP status 400: {\"errorCode\":\"4001\"}.");

		let err = Error::Unauthorized { body: "Invalid Credentials".into() };

		assert_eq!(err.to_string(), "Request was rejected as unauthorized: Invalid Credentials.");
	}

	#[test]
	fn validation_errors_convert_transparently() {
		let err: Error = ValidationError::DescriptionCharacter { character: '$' }.into();

		assert!(matches!(err, Error::Validation(ValidationError::DescriptionCharacter { .. })));
		assert_eq!(err.to_string(), "Description contains the unsupported character `$`.");
	}
}
