//! `Admin.Login` request and result shapes.

use serde::{Deserialize, Serialize};

use crate::host_port::ServerGroups;
use crate::macaroon::{Macaroon, MacaroonSlice};

/// Facade that hosts the login handshake.
pub const ADMIN_FACADE: &str = "Admin";

/// Method name of the login call on [`ADMIN_FACADE`].
pub const LOGIN_METHOD: &str = "Login";

/// Credentials sent to `Admin.Login`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
	/// Entity tag being authenticated; empty for macaroon-only logins.
	#[serde(rename = "auth-tag")]
	pub auth_tag: String,
	/// Password or other shared secret.
	pub credentials: String,
	/// Machine provisioning nonce; empty for everything but machine agents.
	pub nonce: String,
	/// Macaroon slices presented as proof of identity.
	pub macaroons: Vec<MacaroonSlice>,
}

/// Identity information returned for macaroon-authenticated users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthUserInfo {
	/// Tag string of the authenticated user, e.g. `user-bob@external`.
	pub identity: String,
	#[serde(rename = "display-name", default)]
	pub display_name: String,
	#[serde(rename = "controller-access", default)]
	pub controller_access: String,
	#[serde(rename = "model-access", default)]
	pub model_access: String,
}

/// Versions of one facade the server is willing to serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeVersions {
	pub name: String,
	pub versions: Vec<u32>,
}

/// Result of `Admin.Login`.
///
/// Either `discharge_required` is set, in which case the remaining fields are
/// meaningless, or the login succeeded and the session fields are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResult {
	/// Third-party caveated macaroon that must be discharged before retrying.
	#[serde(rename = "discharge-required", default, skip_serializing_if = "Option::is_none")]
	pub discharge_required: Option<Macaroon>,
	/// Human-readable reason accompanying `discharge_required`.
	#[serde(rename = "discharge-required-error", default, skip_serializing_if = "Option::is_none")]
	pub discharge_required_reason: Option<String>,
	/// Set when the server resolved the caller's identity from macaroons.
	#[serde(rename = "user-info", default, skip_serializing_if = "Option::is_none")]
	pub user_info: Option<AuthUserInfo>,
	#[serde(default)]
	pub servers: ServerGroups,
	#[serde(rename = "model-tag", default)]
	pub model_tag: String,
	#[serde(rename = "controller-tag", default)]
	pub controller_tag: String,
	#[serde(default)]
	pub facades: Vec<FacadeVersions>,
	/// Server build version; empty when the server does not report it.
	#[serde(rename = "server-version", default)]
	pub server_version: String,
}
