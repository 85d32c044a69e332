//! RPC call seam between the session layer and the wire transport.
//!
//! The transport (websocket framing, request ids, response correlation)
//! lives behind [`ApiCaller`]. Everything in this crate talks to the server
//! exclusively through it, which keeps the login handshake testable against a
//! scripted caller.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

/// Boxed, sendable future used by the object-safe traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A connected RPC endpoint.
///
/// `api_call` performs exactly one request/response exchange. Implementations
/// must not retry; failures are reported as [`Error::Transport`] or
/// [`Error::Remote`] and propagate unchanged through the session layer.
///
/// [`Error::Transport`]: crate::Error::Transport
/// [`Error::Remote`]: crate::Error::Remote
pub trait ApiCaller: Send + Sync {
	/// Invokes `method` on version `version` of `facade`, addressed to object `id`.
	fn api_call<'a>(&'a self, facade: &'a str, version: u32, id: &'a str, method: &'a str, args: Value) -> BoxFuture<'a, Result<Value>>;

	/// Closes the underlying connection.
	fn close(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async { Ok(()) })
	}
}

/// Serializes `params`, performs the call, and deserializes the response.
pub async fn call<P: Serialize, R: DeserializeOwned>(
	caller: &dyn ApiCaller,
	facade: &str,
	version: u32,
	id: &str,
	method: &str,
	params: P,
) -> Result<R> {
	let args = serde_json::to_value(params)?;
	tracing::debug!(target: "ctrl.rpc", facade, version, method, "api call");
	let response = caller.api_call(facade, version, id, method, args).await?;
	serde_json::from_value(response).map_err(Into::into)
}
