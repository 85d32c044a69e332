//! Server address list maintenance.
//!
//! After a login the server reports every address of every controller
//! machine. The address this client actually dialed is known to work, so it
//! is moved to the front: its group becomes group 0 and it becomes the first
//! address of that group. Everything else keeps its relative order, which
//! lets later reconnects try the proven address first without reshuffling
//! the rest of the list. Repeated host/port pairs are dropped, keeping the
//! first occurrence.

use std::collections::HashSet;

use ctrl_protocol::{HostPort, ServerGroups};

use crate::error::{Error, Result};

/// Orders `servers` so that `dialed` is the first address of the first group.
///
/// An address not present in the list is parsed and prepended as a new
/// single-address group.
pub fn normalize(servers: ServerGroups, dialed: &str) -> Result<ServerGroups> {
	let mut servers = dedup(servers);
	if let Some((group, index)) = locate(&servers, dialed) {
		slide_to_front(&mut servers, group, index);
		return Ok(servers);
	}

	let (host, port) = split_host_port(dialed)?;
	let port = port.parse::<u16>().map_err(|_| Error::InvalidPort {
		addr: dialed.to_string(),
		port: port.to_string(),
	})?;

	let mut result = Vec::with_capacity(servers.len() + 1);
	result.push(vec![HostPort::new(host, port)]);
	result.extend(servers);
	Ok(result)
}

/// Drops every host/port seen earlier in the list, then any group left empty.
fn dedup(servers: ServerGroups) -> ServerGroups {
	let mut seen = HashSet::new();
	servers
		.into_iter()
		.map(|group| group.into_iter().filter(|hp| seen.insert(hp.net_addr())).collect::<Vec<_>>())
		.filter(|group| !group.is_empty())
		.collect()
}

fn locate(servers: &ServerGroups, addr: &str) -> Option<(usize, usize)> {
	servers
		.iter()
		.enumerate()
		.find_map(|(i, group)| group.iter().position(|hp| hp.net_addr() == addr).map(|j| (i, j)))
}

/// Moves `servers[group][index]` to the front of its group, then that group
/// to the front of the list.
fn slide_to_front(servers: &mut ServerGroups, group: usize, index: usize) {
	servers[group][..=index].rotate_right(1);
	servers[..=group].rotate_right(1);
}

/// Splits `host:port`, accepting `[v6-host]:port` for IPv6 literals.
pub fn split_host_port(addr: &str) -> Result<(&str, &str)> {
	let malformed = |reason| Error::MalformedAddress {
		addr: addr.to_string(),
		reason,
	};

	let colon = addr.rfind(':').ok_or_else(|| malformed("missing port in address"))?;
	let (host, port) = (&addr[..colon], &addr[colon + 1..]);

	let host = if let Some(inner) = host.strip_prefix('[') {
		inner.strip_suffix(']').ok_or_else(|| malformed("missing ']' in address"))?
	} else {
		if host.contains(':') {
			return Err(malformed("too many colons in address"));
		}
		host
	};

	if host.contains(['[', ']']) {
		return Err(malformed("unexpected bracket in address"));
	}
	Ok((host, port))
}

#[cfg(test)]
mod tests {
	use ctrl_protocol::AddressType;

	use super::*;

	fn hp(host: &str, port: u16) -> HostPort {
		HostPort::new(host, port)
	}

	fn servers() -> ServerGroups {
		vec![
			vec![hp("10.0.0.1", 17070), hp("192.168.0.1", 17070)],
			vec![hp("10.0.0.2", 17070), hp("192.168.0.2", 17070), hp("ctrl-2.example.com", 17070)],
			vec![hp("10.0.0.3", 17070)],
		]
	}

	fn flat(servers: &ServerGroups) -> Vec<String> {
		let mut all: Vec<String> = servers.iter().flatten().map(HostPort::net_addr).collect();
		all.sort();
		all
	}

	#[test]
	fn known_address_moves_to_front_of_front_group() {
		let before = servers();
		let after = normalize(before.clone(), "ctrl-2.example.com:17070").unwrap();

		assert_eq!(
			after,
			vec![
				vec![hp("ctrl-2.example.com", 17070), hp("10.0.0.2", 17070), hp("192.168.0.2", 17070)],
				vec![hp("10.0.0.1", 17070), hp("192.168.0.1", 17070)],
				vec![hp("10.0.0.3", 17070)],
			]
		);
		assert_eq!(flat(&before), flat(&after));
	}

	#[test]
	fn every_known_address_ends_up_first() {
		let before = servers();
		for addr in before.iter().flatten().map(HostPort::net_addr) {
			let after = normalize(before.clone(), &addr).unwrap();
			assert_eq!(after[0][0].net_addr(), addr);
			assert_eq!(after.len(), before.len());
			assert_eq!(flat(&before), flat(&after));
		}
	}

	#[test]
	fn address_already_first_is_a_no_op() {
		let before = servers();
		assert_eq!(normalize(before.clone(), "10.0.0.1:17070").unwrap(), before);
	}

	#[test]
	fn unknown_address_is_prepended_as_its_own_group() {
		let before = servers();
		let after = normalize(before.clone(), "10.0.0.9:17070").unwrap();

		let mut expected = vec![vec![hp("10.0.0.9", 17070)]];
		expected.extend(before);
		assert_eq!(after, expected);
		assert_eq!(after[0][0].address.kind, AddressType::Ipv4);
	}

	#[test]
	fn unknown_address_prepends_to_empty_list() {
		let after = normalize(Vec::new(), "ctrl.example.com:443").unwrap();
		assert_eq!(after, vec![vec![hp("ctrl.example.com", 443)]]);
	}

	#[test]
	fn ipv6_addresses_match_in_bracketed_form() {
		let before = vec![vec![hp("10.0.0.1", 17070)], vec![hp("10.0.0.2", 17070), hp("fe80::2", 17070)]];
		let after = normalize(before, "[fe80::2]:17070").unwrap();
		assert_eq!(after[0][0], hp("fe80::2", 17070));

		let added = normalize(Vec::new(), "[::1]:17070").unwrap();
		assert_eq!(added[0][0].host(), "::1");
		assert_eq!(added[0][0].address.kind, AddressType::Ipv6);
	}

	#[test]
	fn untyped_ipv6_entry_matches_bracketed_dial_address() {
		let untyped: HostPort = serde_json::from_value(serde_json::json!({ "value": "fe80::2", "port": 17070 })).unwrap();
		let before = vec![vec![hp("10.0.0.1", 17070)], vec![untyped.clone()]];

		let after = normalize(before, "[fe80::2]:17070").unwrap();

		assert_eq!(after, vec![vec![untyped], vec![hp("10.0.0.1", 17070)]]);
	}

	#[test]
	fn repeated_addresses_are_dropped() {
		let before = vec![
			vec![hp("10.0.0.1", 17070), hp("10.0.0.1", 17070)],
			vec![hp("10.0.0.2", 17070), hp("10.0.0.1", 17070)],
			vec![hp("10.0.0.2", 17070)],
		];
		let after = normalize(before, "10.0.0.2:17070").unwrap();
		assert_eq!(after, vec![vec![hp("10.0.0.2", 17070)], vec![hp("10.0.0.1", 17070)]]);

		let prepended = normalize(vec![vec![hp("10.0.0.1", 17070), hp("10.0.0.1", 17070)]], "10.0.0.9:17070").unwrap();
		assert_eq!(prepended, vec![vec![hp("10.0.0.9", 17070)], vec![hp("10.0.0.1", 17070)]]);
	}

	#[test]
	fn non_numeric_port_is_invalid() {
		let err = normalize(servers(), "not-a-port:xyz").unwrap_err();
		assert!(matches!(err, Error::InvalidPort { ref port, .. } if port == "xyz"), "{err}");

		let err = normalize(servers(), "10.0.0.1:99999").unwrap_err();
		assert!(matches!(err, Error::InvalidPort { .. }), "{err}");
	}

	#[test]
	fn missing_colon_is_malformed() {
		let err = normalize(servers(), "no-colon-here").unwrap_err();
		assert!(matches!(err, Error::MalformedAddress { .. }), "{err}");
	}

	#[test]
	fn split_rejects_ambiguous_hosts() {
		assert!(matches!(split_host_port("fe80::1:17070"), Err(Error::MalformedAddress { .. })));
		assert!(matches!(split_host_port("[fe80::1:17070"), Err(Error::MalformedAddress { .. })));
		assert!(matches!(split_host_port("a]b:1"), Err(Error::MalformedAddress { .. })));
		assert_eq!(split_host_port("[fe80::1]:17070").unwrap(), ("fe80::1", "17070"));
		assert_eq!(split_host_port("localhost:0").unwrap(), ("localhost", "0"));
	}
}
