//! Facade version negotiation.

use std::collections::HashMap;

use ctrl_protocol::FacadeVersions;

/// Facade versions this client knows how to speak.
///
/// Kept sorted by name; versions ascending.
pub const CLIENT_FACADES: &[(&str, &[u32])] = &[
	("Addresser", &[2]),
	("CharmRevisionUpdater", &[2]),
	("Cleaner", &[2]),
	("Client", &[1]),
	("DiscoverSpaces", &[2]),
	("Firewaller", &[3]),
	("ImageMetadata", &[2]),
	("InstancePoller", &[3]),
	("KeyUpdater", &[1]),
	("Provisioner", &[2, 3]),
	("Reboot", &[2]),
	("UnitAssigner", &[1]),
	("Uniter", &[3, 4]),
	("Upgrader", &[1]),
];

/// Returns the versions of `facade` supported by this client.
pub fn client_versions(facade: &str) -> Option<&'static [u32]> {
	CLIENT_FACADES
		.binary_search_by(|(name, _)| (*name).cmp(facade))
		.ok()
		.map(|i| CLIENT_FACADES[i].1)
}

/// Server-advertised facade versions from the most recent login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacadeVersionTable {
	facades: HashMap<String, Vec<u32>>,
}

impl FacadeVersionTable {
	/// Builds a fresh table from a login result.
	///
	/// Versions are sorted and deduplicated. A facade listed twice keeps the
	/// later entry.
	pub fn rebuild(list: &[FacadeVersions]) -> Self {
		let facades = list
			.iter()
			.map(|facade| {
				let mut versions = facade.versions.clone();
				versions.sort_unstable();
				versions.dedup();
				(facade.name.clone(), versions)
			})
			.collect();
		Self { facades }
	}

	/// Returns the versions the server advertised for `facade`.
	pub fn versions(&self, facade: &str) -> Option<&[u32]> {
		self.facades.get(facade).map(Vec::as_slice)
	}

	/// Highest version advertised by the server that the client also supports.
	pub fn best_version(&self, facade: &str, client_supported: &[u32]) -> Option<u32> {
		self.versions(facade)?.iter().rev().copied().find(|v| client_supported.contains(v))
	}

	pub fn len(&self) -> usize {
		self.facades.len()
	}

	pub fn is_empty(&self) -> bool {
		self.facades.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table(entries: &[(&str, &[u32])]) -> FacadeVersionTable {
		let list: Vec<FacadeVersions> = entries
			.iter()
			.map(|(name, versions)| FacadeVersions {
				name: name.to_string(),
				versions: versions.to_vec(),
			})
			.collect();
		FacadeVersionTable::rebuild(&list)
	}

	#[test]
	fn best_version_is_max_of_intersection() {
		let t = table(&[("Uniter", &[1, 2, 3])]);
		assert_eq!(t.best_version("Uniter", &[2, 3, 4]), Some(3));
		assert_eq!(t.best_version("Uniter", &[1]), Some(1));
	}

	#[test]
	fn no_overlap_or_unknown_facade_is_none() {
		let t = table(&[("Uniter", &[1, 2])]);
		assert_eq!(t.best_version("Uniter", &[3, 4]), None);
		assert_eq!(t.best_version("Reboot", &[1, 2]), None);
		assert_eq!(t.best_version("Uniter", &[]), None);
	}

	#[test]
	fn unsorted_server_versions_are_normalized() {
		let t = table(&[("Client", &[3, 1, 2, 3])]);
		assert_eq!(t.versions("Client"), Some(&[1, 2, 3][..]));
		assert_eq!(t.best_version("Client", &[1, 2]), Some(2));
	}

	#[test]
	fn rebuild_replaces_rather_than_merges() {
		let first = table(&[("Client", &[1]), ("Uniter", &[4])]);
		let second = table(&[("Client", &[2])]);
		assert_eq!(first.len(), 2);
		assert_eq!(second.len(), 1);
		assert_eq!(second.versions("Uniter"), None);
	}

	#[test]
	fn client_table_is_sorted_for_lookup() {
		assert!(CLIENT_FACADES.windows(2).all(|w| w[0].0 < w[1].0));
		assert_eq!(client_versions("Uniter"), Some(&[3, 4][..]));
		assert_eq!(client_versions("Nope"), None);
	}
}
