//! Connection info persistence and validation.
//!
//! Connection info is everything needed to dial and log in to a controller:
//! where it lives, who to authenticate as, and which model to use.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ctrl_protocol::MacaroonSlice;
use ctrl_runtime::{Tag, TagKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ConnError, Result};

/// Current on-disk schema version for connection info files.
pub const CONNECTION_INFO_SCHEMA_VERSION: u32 = 1;

fn connection_info_schema_version() -> u32 {
	CONNECTION_INFO_SCHEMA_VERSION
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
	/// File schema version.
	#[serde(default = "connection_info_schema_version")]
	pub schema_version: u32,
	/// API server addresses (`host:port`), tried in order.
	#[serde(default)]
	pub addrs: Vec<String>,
	/// PEM-encoded CA certificate the servers are signed with.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ca_cert: Option<String>,
	/// Model to connect to, as a `model-<uuid>` tag.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub model_tag: Option<String>,
	/// Entity to log in as; absent for macaroon-only logins.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tag: Option<String>,
	#[serde(default)]
	pub password: String,
	/// Machine provisioning nonce.
	#[serde(default)]
	pub nonce: String,
	#[serde(default)]
	pub macaroons: Vec<MacaroonSlice>,
	/// Sensitive model settings pushed into every newly opened connection.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub secrets: BTreeMap<String, Value>,
}

impl ConnectionInfo {
	/// Loads connection info from disk. Returns `None` if the file does not exist.
	pub fn load(path: &Path) -> Result<Option<Self>> {
		let content = match fs::read_to_string(path) {
			Ok(c) => c,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(ConnError::Io(err)),
		};

		let value: Value = serde_json::from_str(&content)?;
		let schema_version = value.get("schema_version").and_then(Value::as_u64).unwrap_or(0);
		if schema_version != u64::from(CONNECTION_INFO_SCHEMA_VERSION) {
			return Err(ConnError::Config(format!(
				"unsupported connection info schema_version {schema_version} (expected {CONNECTION_INFO_SCHEMA_VERSION})"
			)));
		}

		let info: Self = serde_json::from_value(value)?;
		info.validate()?;
		debug!(target: "ctrl.conn", path = %path.display(), addrs = info.addrs.len(), "loaded connection info");
		Ok(Some(info))
	}

	/// Saves connection info to disk, creating parent directories.
	pub fn save(&self, path: &Path) -> Result<()> {
		self.validate()?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		let mut normalized = self.clone();
		normalized.schema_version = CONNECTION_INFO_SCHEMA_VERSION;
		fs::write(path, serde_json::to_string_pretty(&normalized)?)?;
		Ok(())
	}

	/// Checks that the tags parse and every address has a port.
	pub fn validate(&self) -> Result<()> {
		self.auth_tag()?;
		if let Some(model) = &self.model_tag {
			let tag = Tag::parse(model)?;
			if tag.kind() != TagKind::Model {
				return Err(ConnError::Config(format!("{model:?} is not a model tag")));
			}
		}
		for addr in &self.addrs {
			ctrl_runtime::address::split_host_port(addr)?;
		}
		Ok(())
	}

	/// Returns the parsed login tag, `None` for macaroon-only logins.
	pub fn auth_tag(&self) -> Result<Option<Tag>> {
		match self.tag.as_deref() {
			None | Some("") => Ok(None),
			Some(tag) => Ok(Some(Tag::parse(tag)?)),
		}
	}
}
