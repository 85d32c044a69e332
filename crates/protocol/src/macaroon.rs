//! Opaque macaroon values carried in login requests and results.
//!
//! Minting and verifying macaroons is the bakery's job. On this side of the
//! wire they are JSON documents that are stored, forwarded, and compared.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single macaroon in its JSON wire encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Macaroon(Value);

impl Macaroon {
	/// Wraps an already-encoded macaroon document.
	pub fn new(value: Value) -> Self {
		Self(value)
	}

	/// Returns the macaroon identifier when the encoding exposes one.
	pub fn identifier(&self) -> Option<&str> {
		self.0.get("identifier").and_then(Value::as_str)
	}

	/// Returns the raw JSON document.
	pub fn as_value(&self) -> &Value {
		&self.0
	}
}

impl From<Value> for Macaroon {
	fn from(value: Value) -> Self {
		Self(value)
	}
}

/// A primary macaroon followed by the discharges that bind to it.
pub type MacaroonSlice = Vec<Macaroon>;
