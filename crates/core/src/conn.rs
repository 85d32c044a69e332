//! Model connection with a lazily opened, shared API state.

use std::sync::Arc;

use ctrl_runtime::{ApiState, BakeryClient, BoxFuture, Error, SessionGuard, SessionProvider, Tag};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::ConnectionInfo;
use crate::dial::{Dialer, open_as};
use crate::error::{ConnError, Result};

/// Client facade method that updates model settings.
pub const MODEL_SET_METHOD: &str = "ModelSet";

/// Opens logged-in API states for a [`Conn`] and pushes secrets into them.
pub struct ApiConnector {
	info: ConnectionInfo,
	tag: Option<Tag>,
	dialer: Arc<dyn Dialer>,
	bakery: BakeryClient,
}

impl SessionProvider for ApiConnector {
	type Session = ApiState;

	fn open(&self) -> BoxFuture<'_, ctrl_runtime::Result<ApiState>> {
		Box::pin(open_as(&self.info, self.tag.as_ref(), self.dialer.as_ref(), self.bakery.clone()))
	}

	/// Overwrites the model's secret settings with the local ones.
	fn setup<'a>(&'a self, state: &'a ApiState) -> BoxFuture<'a, ctrl_runtime::Result<()>> {
		Box::pin(async move {
			if self.info.secrets.is_empty() {
				return Ok(());
			}
			debug!(target: "ctrl.conn", keys = self.info.secrets.len(), "pushing secrets");
			let _: Value = state.client()?.call(MODEL_SET_METHOD, json!({ "config": self.info.secrets })).await?;
			Ok(())
		})
	}

	fn close<'a>(&'a self, state: &'a ApiState) -> BoxFuture<'a, ctrl_runtime::Result<()>> {
		Box::pin(state.close())
	}
}

/// A connection to one model.
///
/// The API state is opened on first use and shared by every caller until
/// [`Conn::close`]. Closing the state obtained from [`Conn::state`] directly
/// leaves the connection unusable; close the `Conn` instead.
pub struct Conn {
	guard: SessionGuard<ApiConnector>,
}

impl Conn {
	/// Validates `info` without connecting.
	pub fn new(info: ConnectionInfo, dialer: Arc<dyn Dialer>, bakery: BakeryClient) -> Result<Self> {
		info.validate()?;
		if info.addrs.is_empty() {
			return Err(Error::NoAddresses.into());
		}
		let tag = info.auth_tag()?;
		Ok(Self {
			guard: SessionGuard::new(ApiConnector { info, tag, dialer, bakery }),
		})
	}

	pub fn info(&self) -> &ConnectionInfo {
		&self.guard.provider().info
	}

	/// Returns the API state, connecting and pushing secrets if needed.
	pub async fn state(&self) -> Result<Arc<ApiState>> {
		self.guard.ensure_session().await.map_err(|err| match err {
			err @ Error::SetupAfterOpen { .. } => ConnError::Secrets(err),
			err => ConnError::Api(err),
		})
	}

	/// Returns true if an API state is currently open.
	pub async fn is_open(&self) -> bool {
		self.guard.current().await.is_some()
	}

	/// Closes the API state, if one is open.
	pub async fn close(&self) -> Result<()> {
		Ok(self.guard.release().await?)
	}
}
