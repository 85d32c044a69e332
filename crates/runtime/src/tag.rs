//! Identity tags.
//!
//! A tag names an entity known to the controller and is the authenticated
//! principal of an API session. Its string form is `<kind>-<encoded id>`:
//!
//! | kind | id | tag |
//! |---|---|---|
//! | user | `bob@external` | `user-bob@external` |
//! | machine | `0/lxc/1` | `machine-0-lxc-1` |
//! | unit | `mysql/0` | `unit-mysql-0` |
//! | application | `mysql` | `application-mysql` |
//! | model | uuid | `model-<uuid>` |
//! | controller | uuid | `controller-<uuid>` |

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

const APPLICATION_SNIPPET: &str = r"[a-z][a-z0-9]*(?:-[a-z0-9]*[a-z][a-z0-9]*)*";
const NUMBER_SNIPPET: &str = r"(?:0|[1-9][0-9]*)";

static VALID_APPLICATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{APPLICATION_SNIPPET}$")).unwrap());
static VALID_UNIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{APPLICATION_SNIPPET}/{NUMBER_SNIPPET}$")).unwrap());
static VALID_MACHINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{NUMBER_SNIPPET}(?:/[a-z]+/{NUMBER_SNIPPET})*$")).unwrap());
static VALID_USER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9.+-]*[a-zA-Z0-9])?(?:@[a-zA-Z0-9](?:[a-zA-Z0-9.-]*[a-zA-Z0-9])?)?$").unwrap());
static VALID_UUID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap());

/// Discriminant of a [`Tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
	User,
	Machine,
	Unit,
	Application,
	Model,
	Controller,
}

impl TagKind {
	/// Returns the tag prefix for this kind.
	pub fn as_str(self) -> &'static str {
		match self {
			TagKind::User => "user",
			TagKind::Machine => "machine",
			TagKind::Unit => "unit",
			TagKind::Application => "application",
			TagKind::Model => "model",
			TagKind::Controller => "controller",
		}
	}

	fn from_prefix(prefix: &str) -> Option<Self> {
		Some(match prefix {
			"user" => TagKind::User,
			"machine" => TagKind::Machine,
			"unit" => TagKind::Unit,
			"application" => TagKind::Application,
			"model" => TagKind::Model,
			"controller" => TagKind::Controller,
			_ => return None,
		})
	}

	fn is_valid_id(self, id: &str) -> bool {
		match self {
			TagKind::User => VALID_USER.is_match(id),
			TagKind::Machine => VALID_MACHINE.is_match(id),
			TagKind::Unit => VALID_UNIT.is_match(id),
			TagKind::Application => VALID_APPLICATION.is_match(id),
			TagKind::Model | TagKind::Controller => VALID_UUID.is_match(id),
		}
	}
}

impl fmt::Display for TagKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An authenticated principal or other named entity.
///
/// Each variant holds the canonical id (`mysql/0`, not `mysql-0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
	User(String),
	Machine(String),
	Unit(String),
	Application(String),
	Model(String),
	Controller(String),
}

impl Tag {
	/// Builds a tag of `kind` from a canonical id, validating the id.
	pub fn new(kind: TagKind, id: impl Into<String>) -> Result<Self> {
		let id = id.into();
		if !kind.is_valid_id(&id) {
			return Err(Error::MalformedTag {
				tag: format!("{}-{}", kind, encode_id(kind, &id)),
			});
		}
		Ok(match kind {
			TagKind::User => Tag::User(id),
			TagKind::Machine => Tag::Machine(id),
			TagKind::Unit => Tag::Unit(id),
			TagKind::Application => Tag::Application(id),
			TagKind::Model => Tag::Model(id),
			TagKind::Controller => Tag::Controller(id),
		})
	}

	/// Parses the string form of a tag.
	pub fn parse(s: &str) -> Result<Self> {
		let malformed = || Error::MalformedTag { tag: s.to_string() };
		let (prefix, encoded) = s.split_once('-').ok_or_else(malformed)?;
		let kind = TagKind::from_prefix(prefix).ok_or_else(malformed)?;
		let id = decode_id(kind, encoded).ok_or_else(malformed)?;
		Tag::new(kind, id).map_err(|_| malformed())
	}

	pub fn kind(&self) -> TagKind {
		match self {
			Tag::User(_) => TagKind::User,
			Tag::Machine(_) => TagKind::Machine,
			Tag::Unit(_) => TagKind::Unit,
			Tag::Application(_) => TagKind::Application,
			Tag::Model(_) => TagKind::Model,
			Tag::Controller(_) => TagKind::Controller,
		}
	}

	/// Returns the canonical id.
	pub fn id(&self) -> &str {
		match self {
			Tag::User(id) | Tag::Machine(id) | Tag::Unit(id) | Tag::Application(id) | Tag::Model(id) | Tag::Controller(id) => id,
		}
	}
}

fn encode_id(kind: TagKind, id: &str) -> String {
	match kind {
		TagKind::Machine | TagKind::Unit => id.replace('/', "-"),
		_ => id.to_string(),
	}
}

fn decode_id(kind: TagKind, encoded: &str) -> Option<String> {
	match kind {
		TagKind::Machine => Some(encoded.replace('-', "/")),
		TagKind::Unit => {
			let (application, number) = encoded.rsplit_once('-')?;
			Some(format!("{application}/{number}"))
		}
		_ => Some(encoded.to_string()),
	}
}

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = self.kind();
		write!(f, "{}-{}", kind, encode_id(kind, self.id()))
	}
}

impl FromStr for Tag {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Tag::parse(s)
	}
}
