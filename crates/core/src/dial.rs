//! Dialing API servers and logging in.

use std::sync::Arc;

use ctrl_runtime::{ApiCaller, ApiState, BakeryClient, BoxFuture, Error, Tag};
use tracing::{debug, warn};

use crate::config::ConnectionInfo;
use crate::error::Result;

/// Opens RPC connections to API server addresses.
///
/// Implementations own TLS and framing; the CA certificate from
/// [`ConnectionInfo::ca_cert`] is theirs to apply.
pub trait Dialer: Send + Sync {
	/// Connects to `addr` (`host:port`) without logging in.
	fn dial<'a>(&'a self, addr: &'a str) -> BoxFuture<'a, ctrl_runtime::Result<Arc<dyn ApiCaller>>>;
}

/// Connects to the first reachable address in `info` and logs in.
pub async fn open(info: &ConnectionInfo, dialer: &dyn Dialer, bakery: BakeryClient) -> Result<ApiState> {
	let tag = info.auth_tag()?;
	Ok(open_as(info, tag.as_ref(), dialer, bakery).await?)
}

/// Tries each address in order until one accepts a login.
///
/// Unreachable servers and transport failures during login move on to the
/// next address. Any other login failure is final, since another server of
/// the same controller would reject the credentials too.
pub(crate) async fn open_as(info: &ConnectionInfo, tag: Option<&Tag>, dialer: &dyn Dialer, bakery: BakeryClient) -> ctrl_runtime::Result<ApiState> {
	let mut last = None;
	for addr in &info.addrs {
		debug!(target: "ctrl.conn", %addr, "dialing api server");
		let caller = match dialer.dial(addr).await {
			Ok(caller) => caller,
			Err(err) => {
				warn!(target: "ctrl.conn", %addr, error = %err, "cannot dial api server");
				last = Some(err);
				continue;
			}
		};

		let state = ApiState::new(caller, addr.as_str(), bakery.clone())?;
		match state.login(tag, &info.password, &info.nonce, info.macaroons.clone()).await {
			Ok(()) => return Ok(state),
			Err(err) => {
				if let Err(close_err) = state.close().await {
					debug!(target: "ctrl.conn", %addr, error = %close_err, "error closing failed connection");
				}
				if !err.is_transport() {
					return Err(err);
				}
				warn!(target: "ctrl.conn", %addr, error = %err, "login interrupted");
				last = Some(err);
			}
		}
	}
	Err(last.unwrap_or(Error::NoAddresses))
}
