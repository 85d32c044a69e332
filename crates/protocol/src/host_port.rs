//! Server addresses as reported in login results.
//!
//! The API server reports its addresses as a list of groups, one group per
//! controller machine, each listing the host/port pairs that reach it.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// Kind of value held by an [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
	/// Dotted-quad IPv4 address.
	Ipv4,
	/// IPv6 address without brackets.
	Ipv6,
	/// DNS name, resolved by the dialer.
	#[default]
	Hostname,
}

impl AddressType {
	/// Classifies a bare host string.
	pub fn derive(host: &str) -> Self {
		if host.parse::<Ipv4Addr>().is_ok() {
			AddressType::Ipv4
		} else if host.parse::<Ipv6Addr>().is_ok() {
			AddressType::Ipv6
		} else {
			AddressType::Hostname
		}
	}
}

/// A network address without a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
	/// Host part, e.g. `10.0.0.1`, `::1`, or `ctrl.example.com`.
	pub value: String,
	/// How `value` should be interpreted.
	#[serde(rename = "type", default)]
	pub kind: AddressType,
	/// Reachability scope reported by the server (`public`, `local-cloud`, ...).
	#[serde(default)]
	pub scope: String,
	/// Network space the address belongs to, if any.
	#[serde(rename = "space-name", default, skip_serializing_if = "Option::is_none")]
	pub space_name: Option<String>,
}

impl Address {
	/// Builds an address of unknown scope, deriving its type from `value`.
	pub fn new(value: impl Into<String>) -> Self {
		let value = value.into();
		Self {
			kind: AddressType::derive(&value),
			value,
			scope: String::new(),
			space_name: None,
		}
	}
}

/// An [`Address`] paired with a TCP port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPort {
	#[serde(flatten)]
	pub address: Address,
	pub port: u16,
}

impl HostPort {
	/// Builds a host/port with a derived address type.
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			address: Address::new(host),
			port,
		}
	}

	/// Returns the host part.
	pub fn host(&self) -> &str {
		&self.address.value
	}

	/// Returns the `host:port` form used for dialing.
	///
	/// Any host containing a colon is bracketed, whatever its reported type.
	pub fn net_addr(&self) -> String {
		if self.address.value.contains(':') {
			format!("[{}]:{}", self.address.value, self.port)
		} else {
			format!("{}:{}", self.address.value, self.port)
		}
	}
}

impl fmt::Display for HostPort {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.net_addr())
	}
}

/// Addresses of every controller machine, one group per machine.
pub type ServerGroups = Vec<Vec<HostPort>>;
