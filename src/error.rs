//! Failure taxonomy shared by the session and the service adapter.

use thiserror::Error;

/// Result alias defaulting to [`QuoteError`].
pub type Result<T, E = QuoteError> = std::result::Result<T, E>;

/// Every failure is recoverable by repeating the user action that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
	/// The service could not be reached or the request never completed.
	#[error("request failed: {0}")]
	Transport(String),
	/// The service answered but refused the operation.
	#[error("{message}")]
	Rejected {
		/// HTTP status of the refusal.
		status: u16,
		/// Reason given by the service, shown to the operator.
		message: String,
	},
	/// The service answered with a body we could not read.
	#[error("unreadable response: {0}")]
	Decode(String),
	/// A local action that is not valid in the current state.
	#[error("{0}")]
	Workflow(&'static str),
}

impl QuoteError {
	/// Validation failures are shown inline; everything else is only logged.
	pub fn is_rejection(&self) -> bool {
		matches!(self, QuoteError::Rejected { .. })
	}
}

impl From<serde_json::Error> for QuoteError {
	fn from(e: serde_json::Error) -> Self {
		QuoteError::Decode(e.to_string())
	}
}

impl From<gloo_net::Error> for QuoteError {
	fn from(e: gloo_net::Error) -> Self {
		match e {
			gloo_net::Error::SerdeError(e) => QuoteError::Decode(e.to_string()),
			other => QuoteError::Transport(other.to_string()),
		}
	}
}
