//! Observability helpers shared by the token manager and the payment façade.
//!
//! # Logging
//!
//! Every operation runs inside an `mvola.operation` span (fields `operation` and `stage`)
//! dispatched to the [`LogHandle`] carried by the client configuration, so callers decide where
//! the events go without installing a process-wide subscriber.
//!
//! # Feature Flags
//!
//! - Enable `metrics` to increment the `mvola_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Client-credentials exchange against the token endpoint.
	TokenFetch,
	/// Merchant payment initiation.
	InitiatePayment,
	/// Payment status lookup.
	Status,
	/// Transaction details lookup.
	Details,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::TokenFetch => "token_fetch",
			OperationKind::InitiatePayment => "initiate_payment",
			OperationKind::Status => "status",
			OperationKind::Details => "details",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
