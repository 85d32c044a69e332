//! Server build version numbers.
//!
//! Versions look like `2.0.1`, `2.0.1.3` (with build number), or
//! `2.1-beta2` (pre-release tag in place of the patch separator).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,9})\.(\d{1,9})(?:\.|-([a-z]+))(\d{1,9})(?:\.(\d{1,9}))?$").unwrap());

/// A parsed version number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Number {
	pub major: u32,
	pub minor: u32,
	/// Pre-release tag such as `beta`; empty for releases.
	pub tag: String,
	pub patch: u32,
	pub build: u32,
}

impl Number {
	/// Parses a version string.
	pub fn parse(s: &str) -> Result<Self> {
		let caps = VERSION_RE.captures(s).ok_or_else(|| Error::MalformedVersion(s.to_string()))?;
		let field = |i: usize| -> Result<u32> {
			match caps.get(i) {
				Some(m) => m.as_str().parse().map_err(|_| Error::MalformedVersion(s.to_string())),
				None => Ok(0),
			}
		};
		Ok(Self {
			major: field(1)?,
			minor: field(2)?,
			tag: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
			patch: field(4)?,
			build: field(5)?,
		})
	}

	/// Returns true for pre-release versions.
	pub fn is_dev(&self) -> bool {
		!self.tag.is_empty()
	}
}

impl Ord for Number {
	fn cmp(&self, other: &Self) -> Ordering {
		self.major
			.cmp(&other.major)
			.then(self.minor.cmp(&other.minor))
			.then_with(|| match (self.tag.is_empty(), other.tag.is_empty()) {
				(true, true) => Ordering::Equal,
				// A release sorts after any pre-release of the same minor.
				(true, false) => Ordering::Greater,
				(false, true) => Ordering::Less,
				(false, false) => self.tag.cmp(&other.tag),
			})
			.then(self.patch.cmp(&other.patch))
			.then(self.build.cmp(&other.build))
	}
}

impl PartialOrd for Number {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl fmt::Display for Number {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.tag.is_empty() {
			write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
		} else {
			write!(f, "{}.{}-{}{}", self.major, self.minor, self.tag, self.patch)?;
		}
		if self.build > 0 {
			write!(f, ".{}", self.build)?;
		}
		Ok(())
	}
}

impl FromStr for Number {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Number::parse(s)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_release_and_dev_versions() {
		let v = Number::parse("2.0.1").unwrap();
		assert_eq!((v.major, v.minor, v.patch, v.build), (2, 0, 1, 0));
		assert!(!v.is_dev());

		let v = Number::parse("2.1-beta2").unwrap();
		assert_eq!(v.tag, "beta");
		assert_eq!(v.patch, 2);
		assert!(v.is_dev());

		let v = Number::parse("1.25.3.7").unwrap();
		assert_eq!(v.build, 7);
		assert_eq!(v.to_string(), "1.25.3.7");
	}

	#[test]
	fn rejects_malformed_versions() {
		for s in ["", "2", "2.0", "2.0.x", "v2.0.1", "2.0-Beta1", "2.0.1.2.3"] {
			assert!(matches!(Number::parse(s), Err(Error::MalformedVersion(_))), "{s}");
		}
	}

	#[test]
	fn pre_releases_sort_before_release() {
		let beta: Number = "2.0-beta3".parse().unwrap();
		let rc: Number = "2.0-rc1".parse().unwrap();
		let release: Number = "2.0.0".parse().unwrap();
		assert!(beta < rc);
		assert!(rc < release);
		assert!(release < "2.0.1".parse().unwrap());
	}
}
