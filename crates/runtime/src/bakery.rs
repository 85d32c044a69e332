//! Macaroon discharge collaborators.
//!
//! Obtaining a discharge macaroon means talking to a third-party identity
//! service, which is the bakery client's business. The login handshake only
//! needs two things from it: a way to satisfy a discharge-required challenge
//! and a jar of macaroons that apply to the API server's URL.

use std::collections::HashMap;
use std::sync::Arc;

use ctrl_protocol::{Macaroon, MacaroonSlice};
use parking_lot::Mutex;
use url::Url;

use crate::connection::BoxFuture;
use crate::error::{Error, Result};

/// Path the discharged macaroons are scoped to.
pub const DISCHARGE_PATH: &str = "/";

/// A discharge-required response from `Admin.Login`.
#[derive(Debug, Clone, PartialEq)]
pub struct DischargeChallenge {
	/// Macaroon carrying the third-party caveat to discharge.
	pub macaroon: Macaroon,
	/// Reason the server gave for requiring the discharge.
	pub reason: String,
	/// Cookie path the resulting macaroons are stored under.
	pub path: String,
}

/// Acquires discharges for a challenge and stores them in the token jar.
pub trait DischargeHandler: Send + Sync {
	fn handle<'a>(&'a self, cookie_url: &'a Url, challenge: &'a DischargeChallenge) -> BoxFuture<'a, Result<()>>;
}

/// Source of macaroons previously obtained for a URL.
pub trait TokenCache: Send + Sync {
	/// Returns every macaroon slice applicable to `url`.
	fn macaroons_for(&self, url: &Url) -> Vec<MacaroonSlice>;
}

/// Discharger used when no identity service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDischarger;

impl DischargeHandler for NoDischarger {
	fn handle<'a>(&'a self, _cookie_url: &'a Url, challenge: &'a DischargeChallenge) -> BoxFuture<'a, Result<()>> {
		let reason = challenge.reason.clone();
		Box::pin(async move { Err(Error::DischargeUnavailable(reason)) })
	}
}

/// In-process macaroon jar keyed by origin and path.
#[derive(Debug, Default)]
pub struct MemoryJar {
	entries: Mutex<HashMap<String, Vec<(String, MacaroonSlice)>>>,
}

impl MemoryJar {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `slice` for requests to `url`'s origin under `path`.
	pub fn add(&self, url: &Url, path: &str, slice: MacaroonSlice) {
		self.entries
			.lock()
			.entry(url.origin().ascii_serialization())
			.or_default()
			.push((path.to_string(), slice));
	}

	pub fn len(&self) -> usize {
		self.entries.lock().values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl TokenCache for MemoryJar {
	fn macaroons_for(&self, url: &Url) -> Vec<MacaroonSlice> {
		self.entries
			.lock()
			.get(&url.origin().ascii_serialization())
			.map(|slices| {
				slices
					.iter()
					.filter(|(path, _)| url.path().starts_with(path.as_str()))
					.map(|(_, slice)| slice.clone())
					.collect()
			})
			.unwrap_or_default()
	}
}

/// Discharge handler and macaroon jar used by a login.
///
/// The handler is expected to store what it obtains in the same jar, so that
/// a retry can read the original macaroon together with its discharges.
#[derive(Clone)]
pub struct BakeryClient {
	pub discharger: Arc<dyn DischargeHandler>,
	pub jar: Arc<dyn TokenCache>,
}

impl BakeryClient {
	pub fn new(discharger: Arc<dyn DischargeHandler>, jar: Arc<dyn TokenCache>) -> Self {
		Self { discharger, jar }
	}
}

impl Default for BakeryClient {
	fn default() -> Self {
		Self::new(Arc::new(NoDischarger), Arc::new(MemoryJar::new()))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn slice(id: &str) -> MacaroonSlice {
		vec![Macaroon::new(json!({ "identifier": id }))]
	}

	#[test]
	fn jar_matches_origin_and_path_prefix() {
		let jar = MemoryJar::new();
		let api = Url::parse("https://10.0.0.1:17070/").unwrap();
		jar.add(&api, "/", slice("root"));
		jar.add(&api, "/model", slice("model-only"));
		jar.add(&Url::parse("https://10.0.0.2:17070/").unwrap(), "/", slice("other"));

		let found = jar.macaroons_for(&api);
		assert_eq!(found, vec![slice("root")]);

		let nested = jar.macaroons_for(&Url::parse("https://10.0.0.1:17070/model/x").unwrap());
		assert_eq!(nested.len(), 2);
		assert_eq!(jar.len(), 3);
	}

	#[tokio::test]
	async fn no_discharger_fails_with_reason() {
		let challenge = DischargeChallenge {
			macaroon: Macaroon::new(json!({})),
			reason: "identity required".into(),
			path: DISCHARGE_PATH.into(),
		};
		let url = Url::parse("https://10.0.0.1:17070/").unwrap();
		let err = NoDischarger.handle(&url, &challenge).await.unwrap_err();
		assert!(err.to_string().contains("identity required"));
	}
}
