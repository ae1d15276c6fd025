//! Client-credentials exchange against `POST {base_url}/token`.

// crates.io
use oauth2::http::{
	Method, Request,
	header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::Token,
	config::TOKEN_SCOPE,
	error::ConfigError,
	http::{self, HttpTransport},
	manager::TokenManager,
};

const GRANT_TYPE: &str = "client_credentials";

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	#[serde(default)]
	token_type: String,
	#[serde(default)]
	scope: String,
	#[serde(default)]
	expires_in: Option<i64>,
}

impl<C> TokenManager<C>
where
	C: ?Sized + HttpTransport,
{
	/// Runs one exchange and builds the resulting token; does not install it.
	pub(super) async fn exchange_client_credentials(&self) -> Result<Token> {
		let body = form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", GRANT_TYPE)
			.append_pair("scope", TOKEN_SCOPE)
			.finish();
		let request = Request::builder()
			.method(Method::POST)
			.uri(self.config.token_url()?.as_str())
			.header(AUTHORIZATION, self.config.credential.basic_authorization())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(CACHE_CONTROL, "no-cache")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let response = http::send(self.http_client.as_ref(), request).await?;
		let fetched_at = self.now();
		let payload: TokenResponse = http::decode_json(&response)?;
		let expires_in = payload.expires_in.ok_or(ConfigError::MissingExpiresIn)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		Token::builder(payload.access_token)
			.token_type(payload.token_type)
			.scope(payload.scope)
			.issued_at(fetched_at)
			.expires_in(Duration::seconds(expires_in))
			.build()
			.map_err(|e| ConfigError::from(e).into())
	}
}
