//! MVola merchant-pay client: cached client-credential tokens with singleflight refreshes,
//! validated payment requests, and typed transaction lookups over a pluggable HTTP transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod obs;
pub mod transaction;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
