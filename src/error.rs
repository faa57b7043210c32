//! Crate-wide error type.

use thiserror::Error;

/// Errors surfaced by user-initiated operations.
///
/// Background paths (auto-indexing, enrichment on item update) never return
/// these; they report through an [`EventSink`](crate::events::EventSink).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
	/// Transport failure or non-success status from the search backend.
	#[error("network error: {message}")]
	Network {
		/// HTTP status, when the backend answered at all.
		status: Option<u16>,
		/// Status text plus whatever detail the backend returned.
		message: String,
	},

	/// Empty or missing query/text, rejected before any network call.
	#[error("validation error: {0}")]
	Validation(String),

	/// The backend answered 2xx with a body that does not match the contract.
	#[error("malformed response: {0}")]
	Decode(String),

	/// Invalid configuration.
	#[error("invalid configuration: {0}")]
	Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// Builds a `Network` error from a non-success status and response body.
	pub fn status(code: u16, reason: Option<&str>, body: &str) -> Self {
		let reason = reason.unwrap_or("Unknown Status");
		let body = body.trim();
		let message = if body.is_empty() {
			format!("{code} {reason}")
		} else {
			format!("{code} {reason}: {body}")
		};
		Error::Network {
			status: Some(code),
			message,
		}
	}

	/// Whether this error came from the transport or the backend status.
	pub fn is_network(&self) -> bool {
		matches!(self, Error::Network { .. })
	}
}

impl From<reqwest::Error> for Error {
	fn from(e: reqwest::Error) -> Self {
		if e.is_decode() {
			return Error::Decode(e.to_string());
		}
		Error::Network {
			status: e.status().map(|s| s.as_u16()),
			message: e.to_string(),
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Error::Config(e.to_string())
	}
}
