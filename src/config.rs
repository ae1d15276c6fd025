//! Validated client configuration: credentials, partner identity, environment, and endpoints.
//!
//! [`ClientConfig`] values are only obtainable through [`ClientConfigBuilder`], which rejects
//! empty credentials and, in sandbox mode, partner phone numbers outside the sandbox test
//! numbers. Endpoint URLs are derived from the configured base URL.

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{Credential, Partner},
	error::ConfigError,
	obs::LogHandle,
};

/// Sandbox host.
pub const SANDBOX_URL: &str = "https://devapi.mvola.mg";
/// Production host.
pub const PRODUCTION_URL: &str = "https://api.mvola.mg";
/// Scope requested from the token endpoint.
pub const TOKEN_SCOPE: &str = "EXT_INT_MVOLA_SCOPE";
/// Merchant-pay API version embedded in endpoint paths.
pub const API_VERSION: &str = "1.0.0";
/// The only MSISDNs the sandbox accepts.
pub const SANDBOX_PHONE_NUMBERS: [&str; 2] = ["0343500003", "0343500004"];

const MERCHANT_PAY_SEGMENTS: [&str; 6] =
	["mvola", "mm", "transactions", "type", "merchantpay", API_VERSION];

/// Returns `true` if `number` is one of [`SANDBOX_PHONE_NUMBERS`].
pub fn is_sandbox_phone_number(number: &str) -> bool {
	SANDBOX_PHONE_NUMBERS.contains(&number)
}

/// Target MVola environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// `devapi.mvola.mg`; only the sandbox test numbers are accepted.
	Sandbox,
	#[default]
	/// `api.mvola.mg`.
	Production,
}
impl Environment {
	/// Default base URL for the environment.
	pub const fn base_url(self) -> &'static str {
		match self {
			Environment::Sandbox => SANDBOX_URL,
			Environment::Production => PRODUCTION_URL,
		}
	}

	/// Stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Environment::Sandbox => "sandbox",
			Environment::Production => "production",
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error returned by the strict [`UserLanguage`] parser.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unsupported user language `{0}`; expected FR or MG.")]
pub struct UnsupportedLanguage(pub String);

/// Language the API uses for user-facing messages (`UserLanguage` header).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserLanguage {
	#[default]
	/// French.
	#[serde(rename = "FR")]
	Fr,
	/// Malagasy.
	#[serde(rename = "MG")]
	Mg,
}
impl UserLanguage {
	/// Header value.
	pub const fn as_str(self) -> &'static str {
		match self {
			UserLanguage::Fr => "FR",
			UserLanguage::Mg => "MG",
		}
	}

	/// Parses `raw` case-insensitively, logging a warning and falling back to the default
	/// language when the code is unsupported.
	pub fn parse_or_default(raw: &str, log: &LogHandle) -> Self {
		raw.parse().unwrap_or_else(|err: UnsupportedLanguage| {
			let fallback = Self::default();

			log.in_scope(|| {
				tracing::warn!(
					requested = %err.0,
					fallback = fallback.as_str(),
					"unsupported user language, using the default"
				)
			});

			fallback
		})
	}
}
impl FromStr for UserLanguage {
	type Err = UnsupportedLanguage;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"FR" => Ok(Self::Fr),
			"MG" => Ok(Self::Mg),
			_ => Err(UnsupportedLanguage(s.to_owned())),
		}
	}
}
impl Display for UserLanguage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Immutable configuration consumed by the token manager and the payment façade.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Consumer key/secret.
	pub credential: Credential,
	/// Merchant identity.
	pub partner: Partner,
	/// Target environment.
	pub environment: Environment,
	/// Root URL every endpoint hangs off.
	pub base_url: Url,
	/// Logging capability used by every operation.
	pub log: LogHandle,
}
impl ClientConfig {
	/// Creates a new builder for the provided consumer credentials.
	pub fn builder(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<String>,
	) -> ClientConfigBuilder {
		ClientConfigBuilder::new(consumer_key, consumer_secret)
	}

	/// Returns `true` when targeting the sandbox.
	pub fn is_sandbox(&self) -> bool {
		matches!(self.environment, Environment::Sandbox)
	}

	/// `POST {base_url}/token`.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(["token"])
	}

	/// `{base_url}/mvola/mm/transactions/type/merchantpay/1.0.0[/{segments}]`.
	pub fn merchant_pay_url<'a>(
		&self,
		segments: impl IntoIterator<Item = &'a str>,
	) -> Result<Url, ConfigError> {
		self.endpoint(MERCHANT_PAY_SEGMENTS.into_iter().chain(segments))
	}

	fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ConfigError> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidBaseUrl { url: self.base_url.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}
}
