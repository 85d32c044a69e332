//! Error types for the controller API runtime.

use thiserror::Error;

use crate::tag::TagKind;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while establishing or using an API session.
#[derive(Debug, Error)]
pub enum Error {
	/// The RPC transport failed below this layer.
	#[error("Transport error: {0}")]
	Transport(String),

	/// The server answered a call with an RPC-level error.
	#[error("{message}{}", if code.is_empty() { String::new() } else { format!(" ({code})") })]
	Remote {
		/// Machine-readable error code, possibly empty.
		code: String,
		/// Human-readable error message.
		message: String,
	},

	/// A login round-trip could not be completed.
	#[error("login request failed (attempt {attempt}): {source}")]
	Login {
		/// 1 for the initial request, 2 for the post-discharge retry.
		attempt: u8,
		#[source]
		source: Box<Error>,
	},

	/// The discharge handler could not satisfy a discharge-required challenge.
	#[error("cannot discharge login macaroon: {source}")]
	DischargeFailed {
		#[source]
		source: Box<Error>,
	},

	/// No discharge handler is configured for a discharge-required challenge.
	#[error("no discharger configured to satisfy challenge: {0}")]
	DischargeUnavailable(String),

	/// The server asked for a discharge again after one had been provided.
	#[error("login with discharged macaroons failed: {reason}")]
	DischargeExhausted { reason: String },

	/// An identity tag string could not be parsed.
	#[error("\"{tag}\" is not a valid tag")]
	MalformedTag { tag: String },

	/// A version string could not be parsed.
	#[error("invalid version {0:?}")]
	MalformedVersion(String),

	/// An address is not of the form `host:port`.
	#[error("malformed address {addr:?}: {reason}")]
	MalformedAddress { addr: String, reason: &'static str },

	/// The port part of an address is not a valid port number.
	#[error("invalid port {port:?} in address {addr:?}")]
	InvalidPort { addr: String, port: String },

	/// A facade that needs a particular principal was requested by another kind.
	#[error("expected {expected} tag, got {}", actual.map_or("anonymous", TagKind::as_str))]
	PrincipalMismatch {
		expected: TagKind,
		actual: Option<TagKind>,
	},

	/// Neither side has a version of the facade in common.
	#[error("facade {name:?} is not supported by the API server")]
	FacadeNotSupported { name: String },

	/// The operation needs a completed login.
	#[error("not logged in")]
	NotLoggedIn,

	/// No address was available to dial.
	#[error("no API addresses to connect to")]
	NoAddresses,

	/// Setup after opening a session failed; the session was closed again.
	#[error(
		"session setup failed: {source}{}",
		close_error.as_ref().map(|e| format!(" (error closing session: {e})")).unwrap_or_default()
	)]
	SetupAfterOpen {
		#[source]
		source: Box<Error>,
		/// Error returned while closing the half-initialized session, if any.
		close_error: Option<Box<Error>>,
	},

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Peels login context wrappers and returns the error that caused them.
	pub fn root_cause(&self) -> &Error {
		match self {
			Error::Login { source, .. } => source.root_cause(),
			other => other,
		}
	}

	/// Returns true if the underlying failure came from the transport.
	pub fn is_transport(&self) -> bool {
		matches!(self.root_cause(), Error::Transport(_))
	}

	/// Returns true if the server kept demanding discharges.
	pub fn is_discharge_exhausted(&self) -> bool {
		matches!(self, Error::DischargeExhausted { .. })
	}

	/// Returns the error code if this is a Remote error.
	pub fn remote_code(&self) -> Option<&str> {
		match self.root_cause() {
			Error::Remote { code, .. } => Some(code),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn root_cause_unwraps_login_context() {
		let err = Error::Login {
			attempt: 2,
			source: Box::new(Error::Transport("connection reset".into())),
		};
		assert!(err.is_transport());
		assert_eq!(err.to_string(), "login request failed (attempt 2): Transport error: connection reset");
	}

	#[test]
	fn principal_mismatch_names_both_kinds() {
		let err = Error::PrincipalMismatch {
			expected: TagKind::Machine,
			actual: Some(TagKind::User),
		};
		assert_eq!(err.to_string(), "expected machine tag, got user");

		let anonymous = Error::PrincipalMismatch {
			expected: TagKind::Unit,
			actual: None,
		};
		assert_eq!(anonymous.to_string(), "expected unit tag, got anonymous");
	}

	#[test]
	fn setup_error_mentions_close_failure() {
		let err = Error::SetupAfterOpen {
			source: Box::new(Error::Remote {
				code: "unauthorized access".into(),
				message: "permission denied".into(),
			}),
			close_error: Some(Box::new(Error::Transport("broken pipe".into()))),
		};
		assert_eq!(
			err.to_string(),
			"session setup failed: permission denied (unauthorized access) (error closing session: Transport error: broken pipe)"
		);
	}
}
