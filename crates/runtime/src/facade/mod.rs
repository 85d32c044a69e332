//! Per-facade RPC proxies.
//!
//! A [`Facade`] binds a facade name to the version negotiated at login and
//! forwards calls to the connection it was created from. What the methods of
//! each facade mean is up to the caller; this layer only picks the version
//! and, for agent facades, checks who is logged in.

mod versions;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use versions::{CLIENT_FACADES, FacadeVersionTable, client_versions};

use crate::connection::{self, ApiCaller};
use crate::error::{Error, Result};
use crate::state::ApiState;
use crate::tag::{Tag, TagKind};

/// RPC proxy for one facade at a fixed version.
#[derive(Clone)]
pub struct Facade {
	name: &'static str,
	version: u32,
	principal: Option<Tag>,
	caller: Arc<dyn ApiCaller>,
}

impl Facade {
	/// Calls `method` on the facade's root object.
	pub async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R> {
		connection::call(self.caller.as_ref(), self.name, self.version, "", method, params).await
	}

	/// Calls `method` on the object named by `id`.
	pub async fn call_object<P: Serialize, R: DeserializeOwned>(&self, id: &str, method: &str, params: P) -> Result<R> {
		connection::call(self.caller.as_ref(), self.name, self.version, id, method, params).await
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the negotiated facade version.
	pub fn version(&self) -> u32 {
		self.version
	}

	/// Returns the agent this facade acts for, if it is an agent facade.
	pub fn principal(&self) -> Option<&Tag> {
		self.principal.as_ref()
	}
}

impl std::fmt::Debug for Facade {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Facade")
			.field("name", &self.name)
			.field("version", &self.version)
			.field("principal", &self.principal)
			.finish()
	}
}

impl ApiState {
	/// Returns a proxy for `name` at the best mutually supported version.
	pub fn facade(&self, name: &'static str) -> Result<Facade> {
		self.bind_facade(name, None)
	}

	fn bind_facade(&self, name: &'static str, principal: Option<Tag>) -> Result<Facade> {
		if !self.is_logged_in() {
			return Err(Error::NotLoggedIn);
		}
		let version = self
			.best_facade_version(name)
			.ok_or_else(|| Error::FacadeNotSupported { name: name.to_string() })?;
		Ok(Facade {
			name,
			version,
			principal,
			caller: self.caller(),
		})
	}

	/// Returns the logged-in tag if it is of `expected` kind.
	fn require_principal(&self, expected: TagKind) -> Result<Tag> {
		match self.auth_tag() {
			Some(tag) if tag.kind() == expected => Ok(tag),
			other => Err(Error::PrincipalMismatch {
				expected,
				actual: other.map(|t| t.kind()),
			}),
		}
	}

	/// Client facade used by end-user tooling.
	pub fn client(&self) -> Result<Facade> {
		self.facade("Client")
	}

	/// Facade used by the unit assigner worker.
	pub fn unit_assigner(&self) -> Result<Facade> {
		self.facade("UnitAssigner")
	}

	/// Facade used by the provisioner worker.
	pub fn provisioner(&self) -> Result<Facade> {
		self.facade("Provisioner")
	}

	/// Facade used by the uniter; the session must be logged in as a unit.
	pub fn uniter(&self) -> Result<Facade> {
		let unit = self.require_principal(TagKind::Unit)?;
		self.bind_facade("Uniter", Some(unit))
	}

	pub fn firewaller(&self) -> Result<Facade> {
		self.facade("Firewaller")
	}

	pub fn upgrader(&self) -> Result<Facade> {
		self.facade("Upgrader")
	}

	/// Facade used by the reboot worker; the session must be logged in as a machine.
	pub fn reboot(&self) -> Result<Facade> {
		let machine = self.require_principal(TagKind::Machine)?;
		self.bind_facade("Reboot", Some(machine))
	}

	pub fn addresser(&self) -> Result<Facade> {
		self.facade("Addresser")
	}

	pub fn discover_spaces(&self) -> Result<Facade> {
		self.facade("DiscoverSpaces")
	}

	pub fn key_updater(&self) -> Result<Facade> {
		self.facade("KeyUpdater")
	}

	pub fn instance_poller(&self) -> Result<Facade> {
		self.facade("InstancePoller")
	}

	pub fn charm_revision_updater(&self) -> Result<Facade> {
		self.facade("CharmRevisionUpdater")
	}

	pub fn cleaner(&self) -> Result<Facade> {
		self.facade("Cleaner")
	}

	/// Facade used to publish cloud image metadata.
	pub fn metadata_updater(&self) -> Result<Facade> {
		self.facade("ImageMetadata")
	}
}
