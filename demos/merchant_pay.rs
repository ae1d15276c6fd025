//! Walks a merchant payment through initiation, status polling, and the details lookup against a
//! local mock of the MVola API.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use mvola::{
	config::{ClientConfig, Environment},
	manager::ReqwestTokenManager,
	obs::LogHandle,
	transaction::{PaymentRequest, Transaction},
	url::Url,
};

const MERCHANT_PAY_PATH: &str = "/mvola/mm/transactions/type/merchantpay/1.0.0";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"scope\":\"EXT_INT_MVOLA_SCOPE\",\"expires_in\":3600}",
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(MERCHANT_PAY_PATH);
			then.status(202).header("content-type", "application/json").body(
				"{\"status\":\"pending\",\"serverCorrelationId\":\"demo-srv\",\"notificationMethod\":\"polling\"}",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(format!("{MERCHANT_PAY_PATH}/status/demo-srv"));
			then.status(200).header("content-type", "application/json").body(
				"{\"status\":\"completed\",\"serverCorrelationId\":\"demo-srv\",\"objectReference\":\"653805064\"}",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(format!("{MERCHANT_PAY_PATH}/653805064"));
			then.status(200).header("content-type", "application/json").body(
				"{\"amount\":\"2000.00\",\"currency\":\"Ar\",\"transactionStatus\":\"completed\",\"transactionReference\":\"653805064\"}",
			);
		})
		.await;

	let config = ClientConfig::builder("demo-key", "demo-secret")
		.partner("Demo Shop", "0343500004")
		.environment(Environment::Sandbox)
		.base_url(Url::parse(&server.base_url())?)
		.log_handle(LogHandle::current())
		.build()?;
	let transaction = Transaction::new(Arc::new(ReqwestTokenManager::new(config)));
	let request = PaymentRequest::new(2000, "0343500003", "0343500004", "demo-order-1")
		.description("Demo order 1");
	let initiated = transaction.initiate_payment(request).await?;

	println!(
		"Initiated payment {} ({}).",
		initiated.server_correlation_id.as_deref().unwrap_or("?"),
		initiated.status.as_deref().unwrap_or("unknown")
	);

	let status = transaction
		.status(initiated.server_correlation_id.as_deref().unwrap_or_default(), None)
		.await?;
	let transaction_id = status.transaction_reference.clone().unwrap_or_default();
	let details = transaction.details(&transaction_id, None).await?;

	println!(
		"Transaction {transaction_id} settled: {} {}.",
		details.amount.as_deref().unwrap_or("?"),
		details.currency.as_deref().unwrap_or("?")
	);

	token_mock.assert_async().await;

	Ok(())
}
