// crates.io
use tracing::{
	Dispatch, Span, dispatcher,
	instrument::{Instrument, Instrumented, WithDispatch, WithSubscriber},
};
// self
use crate::{_prelude::*, obs::OperationKind};

/// Future returned by [`LogHandle::instrument_op`].
pub type InstrumentedOp<F> = WithDispatch<Instrumented<F>>;

/// Injected logging capability.
///
/// Wraps a [`tracing::Dispatch`]; operations and their spans are routed to it explicitly instead
/// of whatever global subscriber happens to be installed when the operation runs.
#[derive(Clone)]
pub struct LogHandle {
	dispatch: Dispatch,
}
impl LogHandle {
	/// Captures the dispatcher that is current for the calling thread.
	pub fn current() -> Self {
		Self { dispatch: dispatcher::get_default(Dispatch::clone) }
	}

	/// Routes every event to the provided subscriber.
	pub fn with_dispatch(dispatch: impl Into<Dispatch>) -> Self {
		Self { dispatch: dispatch.into() }
	}

	/// Discards every event.
	pub fn none() -> Self {
		Self { dispatch: Dispatch::none() }
	}

	/// Runs a synchronous section with this handle's dispatcher as the default.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		dispatcher::with_default(&self.dispatch, f)
	}

	/// Creates the `mvola.operation` span for an operation stage.
	pub fn span(&self, kind: OperationKind, stage: &'static str) -> Span {
		self.in_scope(|| tracing::info_span!("mvola.operation", operation = kind.as_str(), stage))
	}

	/// Instruments an async block so its span and events reach this handle's dispatcher.
	pub fn instrument_op<Fut>(
		&self,
		kind: OperationKind,
		stage: &'static str,
		fut: Fut,
	) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span(kind, stage)).with_subscriber(self.dispatch.clone())
	}
}
impl Default for LogHandle {
	fn default() -> Self {
		Self::current()
	}
}
impl Debug for LogHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("LogHandle(..)")
	}
}
