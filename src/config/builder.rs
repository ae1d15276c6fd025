// self
use crate::{
	_prelude::*,
	auth::{Credential, Partner},
	config::{ClientConfig, Environment, UserLanguage, is_sandbox_phone_number},
	error::ConfigError,
	obs::LogHandle,
};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Consumer key/secret pair.
	pub credential: Credential,
	/// Partner display name (required).
	pub partner_name: Option<String>,
	/// Partner MSISDN (required).
	pub partner_phone_number: Option<String>,
	/// Target environment (defaults to production).
	pub environment: Environment,
	/// Raw language code; resolved leniently at build time.
	pub user_language: Option<String>,
	/// Base URL override.
	pub base_url: Option<Url>,
	/// Logging capability; defaults to the dispatcher current at build time.
	pub log: Option<LogHandle>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the consumer credentials.
	pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
		Self {
			credential: Credential::new(consumer_key, consumer_secret),
			partner_name: None,
			partner_phone_number: None,
			environment: Environment::default(),
			user_language: None,
			base_url: None,
			log: None,
		}
	}

	/// Sets the partner name and MSISDN.
	pub fn partner(mut self, name: impl Into<String>, phone_number: impl Into<String>) -> Self {
		self.partner_name = Some(name.into());
		self.partner_phone_number = Some(phone_number.into());

		self
	}

	/// Selects the target environment.
	pub fn environment(mut self, environment: Environment) -> Self {
		self.environment = environment;

		self
	}

	/// Shorthand for toggling between sandbox and production.
	pub fn sandbox(self, sandbox: bool) -> Self {
		self.environment(if sandbox { Environment::Sandbox } else { Environment::Production })
	}

	/// Sets the preferred language code (`FR` or `MG`, case-insensitive).
	pub fn user_language(mut self, code: impl Into<String>) -> Self {
		self.user_language = Some(code.into());

		self
	}

	/// Overrides the environment's base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Injects the logging capability used by every operation.
	pub fn log_handle(mut self, log: LogHandle) -> Self {
		self.log = Some(log);

		self
	}

	/// Validates the configuration and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if self.credential.consumer_key.trim().is_empty() {
			return Err(ConfigError::MissingField { field: "consumer_key" });
		}
		if self.credential.consumer_secret.is_blank() {
			return Err(ConfigError::MissingField { field: "consumer_secret" });
		}

		let name = required(self.partner_name, "partner_name")?;
		let phone_number = required(self.partner_phone_number, "partner_phone_number")?;

		if matches!(self.environment, Environment::Sandbox) && !is_sandbox_phone_number(&phone_number)
		{
			return Err(ConfigError::SandboxPhoneNumber {
				field: "partner phone number",
				number: phone_number,
			});
		}

		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(self.environment.base_url())
				.map_err(|_| ConfigError::InvalidBaseUrl { url: self.environment.base_url().into() })?,
		};

		if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidBaseUrl { url: base_url.to_string() });
		}

		let log = self.log.unwrap_or_else(LogHandle::current);
		let language = self
			.user_language
			.as_deref()
			.map(|code| UserLanguage::parse_or_default(code, &log))
			.unwrap_or_default();

		Ok(ClientConfig {
			credential: self.credential,
			partner: Partner { name, phone_number, language },
			environment: self.environment,
			base_url,
			log,
		})
	}
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
	value
		.map(|value| value.trim().to_owned())
		.filter(|value| !value.is_empty())
		.ok_or(ConfigError::MissingField { field })
}
