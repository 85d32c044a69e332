//! Logged-in API state and the `Admin.Login` handshake.
//!
//! # Handshake
//!
//! ```text
//! AwaitingFirstResponse ──ok──────────────────────────────▶ commit ─▶ LoggedIn
//!        │ discharge-required
//!        ▼
//! AwaitingDischarge ──handler ok──▶ AwaitingSecondResponse ──ok──▶ commit
//!        │ handler error                    │ discharge-required
//!        ▼                                  ▼
//!      Failed                        Failed (exhausted)
//! ```
//!
//! Nothing is written to the committed [`LoginSession`] until every field of
//! the final response has been validated, so a failed re-login leaves the
//! previous session's identity, addresses and facade versions in place.

use std::fmt;
use std::sync::Arc;

use ctrl_protocol::{ADMIN_FACADE, LOGIN_METHOD, LoginRequest, LoginResult, MacaroonSlice, ServerGroups};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::address;
use crate::bakery::{BakeryClient, DISCHARGE_PATH, DischargeChallenge};
use crate::connection::ApiCaller;
use crate::error::{Error, Result};
use crate::facade::{FacadeVersionTable, client_versions};
use crate::tag::Tag;
use crate::version::Number;

/// Reason used when the server omits one from a discharge-required response.
pub const NO_DISCHARGE_REASON: &str = "no reason given for discharge requirement";

/// Versions of the `Admin` facade this client can log in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminVersion {
	/// Retained for controllers that predate v3.
	V2,
	#[default]
	V3,
}

impl AdminVersion {
	pub fn number(self) -> u32 {
		match self {
			AdminVersion::V2 => 2,
			AdminVersion::V3 => 3,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginPhase {
	AwaitingFirstResponse,
	AwaitingDischarge,
	AwaitingSecondResponse,
}

impl fmt::Display for LoginPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			LoginPhase::AwaitingFirstResponse => "awaiting-first-response",
			LoginPhase::AwaitingDischarge => "awaiting-discharge",
			LoginPhase::AwaitingSecondResponse => "awaiting-second-response",
		})
	}
}

/// Everything a successful login commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginSession {
	/// Authenticated principal; `None` until a login resolves one.
	pub auth_tag: Option<Tag>,
	pub model_tag: String,
	pub controller_tag: String,
	/// Server addresses with the dialed address first.
	pub host_ports: ServerGroups,
	pub facades: FacadeVersionTable,
	/// Absent when the server did not report its version.
	pub server_version: Option<Number>,
	pub logged_in: bool,
}

/// A connection to one API server plus the state committed by its last login.
pub struct ApiState {
	caller: Arc<dyn ApiCaller>,
	addr: String,
	cookie_url: Url,
	bakery: BakeryClient,
	session: RwLock<LoginSession>,
}

impl ApiState {
	/// Wraps a connected caller that was dialed at `addr` (`host:port`).
	pub fn new(caller: Arc<dyn ApiCaller>, addr: impl Into<String>, bakery: BakeryClient) -> Result<Self> {
		let addr = addr.into();
		let cookie_url = Url::parse(&format!("https://{addr}/")).map_err(|_| Error::MalformedAddress {
			addr: addr.clone(),
			reason: "cannot form cookie URL",
		})?;
		Ok(Self {
			caller,
			addr,
			cookie_url,
			bakery,
			session: RwLock::new(LoginSession::default()),
		})
	}

	/// Logs in with the current `Admin` facade version.
	///
	/// `tag` is `None` for macaroon-only logins, in which case the bakery's
	/// macaroons for this server are presented as well. The machine `nonce`
	/// should be empty unless logging in as a machine agent.
	pub async fn login(&self, tag: Option<&Tag>, password: &str, nonce: &str, macaroons: Vec<MacaroonSlice>) -> Result<()> {
		self.login_for_version(tag, password, nonce, macaroons, AdminVersion::V3).await
	}

	/// Logs in with an explicit `Admin` facade version.
	pub async fn login_for_version(
		&self,
		tag: Option<&Tag>,
		password: &str,
		nonce: &str,
		macaroons: Vec<MacaroonSlice>,
		version: AdminVersion,
	) -> Result<()> {
		let mut request = LoginRequest {
			auth_tag: tag.map(Tag::to_string).unwrap_or_default(),
			credentials: password.to_string(),
			nonce: nonce.to_string(),
			macaroons,
		};
		if tag.is_none() {
			request.macaroons.extend(self.bakery.jar.macaroons_for(&self.cookie_url));
		}

		let result = self.exchange(version, &mut request).await?;

		let auth_tag = match &result.user_info {
			Some(info) => Some(Tag::parse(&info.identity)?),
			None => tag.cloned(),
		};
		let host_ports = address::normalize(result.servers, &self.addr)?;
		let facades = FacadeVersionTable::rebuild(&result.facades);
		let server_version = match result.server_version.as_str() {
			"" => None,
			v => Some(Number::parse(v)?),
		};

		debug!(
			target: "ctrl.login",
			addr = %self.addr,
			tag = ?auth_tag.as_ref().map(Tag::to_string),
			facades = facades.len(),
			"logged in"
		);
		*self.session.write() = LoginSession {
			auth_tag,
			model_tag: result.model_tag,
			controller_tag: result.controller_tag,
			host_ports,
			facades,
			server_version,
			logged_in: true,
		};
		Ok(())
	}

	/// Runs the login round-trips, discharging at most once.
	async fn exchange(&self, version: AdminVersion, request: &mut LoginRequest) -> Result<LoginResult> {
		let mut phase = LoginPhase::AwaitingFirstResponse;
		loop {
			let attempt = if phase == LoginPhase::AwaitingFirstResponse { 1 } else { 2 };
			debug!(target: "ctrl.login", %phase, admin = version.number(), "sending login request");

			let args = serde_json::to_value(&*request)?;
			let response = self
				.caller
				.api_call(ADMIN_FACADE, version.number(), "", LOGIN_METHOD, args)
				.await
				.map_err(|source| Error::Login {
					attempt,
					source: Box::new(source),
				})?;
			let mut result: LoginResult = serde_json::from_value(response)?;

			let Some(macaroon) = result.discharge_required.take() else {
				return Ok(result);
			};
			let reason = result
				.discharge_required_reason
				.take()
				.filter(|r| !r.is_empty())
				.unwrap_or_else(|| NO_DISCHARGE_REASON.to_string());
			if phase == LoginPhase::AwaitingSecondResponse {
				return Err(Error::DischargeExhausted { reason });
			}

			phase = LoginPhase::AwaitingDischarge;
			debug!(target: "ctrl.login", %phase, %reason, "discharge required");
			let challenge = DischargeChallenge {
				macaroon,
				reason,
				path: DISCHARGE_PATH.to_string(),
			};
			self.bakery
				.discharger
				.handle(&self.cookie_url, &challenge)
				.await
				.map_err(|source| Error::DischargeFailed { source: Box::new(source) })?;

			// The jar now holds the original macaroons plus the new discharges.
			request.macaroons = self.bakery.jar.macaroons_for(&self.cookie_url);
			phase = LoginPhase::AwaitingSecondResponse;
		}
	}

	/// Performs a call on the underlying connection.
	pub async fn call<P: Serialize, R: DeserializeOwned>(&self, facade: &str, version: u32, id: &str, method: &str, params: P) -> Result<R> {
		crate::connection::call(self.caller.as_ref(), facade, version, id, method, params).await
	}

	/// Closes the underlying connection. Committed login state is kept.
	pub async fn close(&self) -> Result<()> {
		debug!(target: "ctrl.login", addr = %self.addr, "closing api connection");
		self.caller.close().await
	}

	/// Returns the address this state was dialed at.
	pub fn addr(&self) -> &str {
		&self.addr
	}

	/// Returns the URL macaroons for this server are scoped to.
	pub fn cookie_url(&self) -> &Url {
		&self.cookie_url
	}

	pub(crate) fn caller(&self) -> Arc<dyn ApiCaller> {
		Arc::clone(&self.caller)
	}

	/// Returns the authenticated principal.
	pub fn auth_tag(&self) -> Option<Tag> {
		self.session.read().auth_tag.clone()
	}

	pub fn model_tag(&self) -> String {
		self.session.read().model_tag.clone()
	}

	pub fn controller_tag(&self) -> String {
		self.session.read().controller_tag.clone()
	}

	/// Returns the server addresses, dialed address first.
	pub fn host_ports(&self) -> ServerGroups {
		self.session.read().host_ports.clone()
	}

	/// Returns the server version, if the server reported one.
	pub fn server_version(&self) -> Option<Number> {
		self.session.read().server_version.clone()
	}

	pub fn is_logged_in(&self) -> bool {
		self.session.read().logged_in
	}

	/// Returns a copy of everything the last successful login committed.
	pub fn session(&self) -> LoginSession {
		self.session.read().clone()
	}

	/// Highest version of `facade` both this client and the server speak.
	pub fn best_facade_version(&self, facade: &str) -> Option<u32> {
		let client = client_versions(facade)?;
		self.session.read().facades.best_version(facade, client)
	}
}

impl fmt::Debug for ApiState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ApiState")
			.field("addr", &self.addr)
			.field("cookie_url", &self.cookie_url.as_str())
			.field("session", &*self.session.read())
			.finish()
	}
}
