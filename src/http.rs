//! Transport primitives for MVola API calls.
//!
//! The module exposes [`HttpTransport`], the client's only dependency on an HTTP stack.
//! Transports execute one fully built [`HttpRequest`] and hand back the [`HttpResponse`]
//! whatever its status; classifying statuses (401 versus any other failure) and decoding bodies
//! happens here, in [`send`] and [`decode_json`], so every transport behaves the same.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Abstraction over HTTP transports capable of executing MVola API calls.
///
/// Callers provide an implementation (typically behind `Arc<T>` where `T: HttpTransport`) and
/// the client requests short-lived [`AsyncHttpClient`] handles for each call. Implementations
/// must be `Send + Sync + 'static` so they can be shared between the token manager and the
/// payment façade, and the request futures their handles return must be `Send`.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle executing a single request.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for the next request.
	fn handle(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`HttpTransport`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Executes `request`, logging both legs, and turns non-2xx statuses into errors.
///
/// `401` maps to [`Error::Unauthorized`]; every other failure status maps to
/// [`Error::InvalidRequest`]. Both carry the raw response body.
pub(crate) async fn send<C>(http_client: &C, request: HttpRequest) -> Result<HttpResponse>
where
	C: ?Sized + HttpTransport,
{
	tracing::debug!(method = %request.method(), uri = %request.uri(), "sending request");

	let handle = http_client.handle();
	let response = handle.call(request).await.map_err(map_transport_error)?;
	let status = response.status();

	tracing::debug!(status = status.as_u16(), body_len = response.body().len(), "received response");

	if status.is_success() {
		return Ok(response);
	}

	let body = String::from_utf8_lossy(response.body()).into_owned();

	if status == StatusCode::UNAUTHORIZED {
		Err(Error::Unauthorized { body })
	} else {
		Err(Error::InvalidRequest { status: status.as_u16(), body })
	}
}

/// Decodes a success body, reporting the failing field path on mismatch.
pub(crate) fn decode_json<T>(response: &HttpResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { source, status: response.status().as_u16() })
}

/// Decodes a success body once, returning the typed view alongside the raw JSON.
pub(crate) fn decode_json_with_raw<T>(response: &HttpResponse) -> Result<(T, serde_json::Value)>
where
	T: DeserializeOwned,
{
	let raw: serde_json::Value = decode_json(response)?;
	let typed = serde_path_to_error::deserialize(&raw)
		.map_err(|source| Error::Decode { source, status: response.status().as_u16() })?;

	Ok((typed, raw))
}

fn map_transport_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { message }.into(),
		other => TransportError::Other { message: other.to_string() }.into(),
	}
}
