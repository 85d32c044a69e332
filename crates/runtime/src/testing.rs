//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ctrl_protocol::Macaroon;
use parking_lot::Mutex;
use serde_json::{Value, json};
use url::Url;

use crate::bakery::{BakeryClient, DischargeChallenge, DischargeHandler, MemoryJar};
use crate::connection::{ApiCaller, BoxFuture};
use crate::error::{Error, Result};

pub const CONTROLLER_UUID: &str = "deadbeef-0bad-400d-8000-4b1d0d06f00d";
pub const MODEL_UUID: &str = "f47ac10b-58cc-4372-a567-0e02b2c3d479";

#[derive(Debug, Clone)]
pub struct RecordedCall {
	pub facade: String,
	pub version: u32,
	pub id: String,
	pub method: String,
	pub args: Value,
}

/// Caller that replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedCaller {
	responses: Mutex<VecDeque<Result<Value>>>,
	calls: Mutex<Vec<RecordedCall>>,
	closes: AtomicUsize,
}

impl ScriptedCaller {
	pub fn new(responses: impl IntoIterator<Item = Result<Value>>) -> Arc<Self> {
		Arc::new(Self {
			responses: Mutex::new(responses.into_iter().collect()),
			..Default::default()
		})
	}

	pub fn push(&self, response: Result<Value>) {
		self.responses.lock().push_back(response);
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().clone()
	}

	pub fn closes(&self) -> usize {
		self.closes.load(Ordering::SeqCst)
	}
}

impl ApiCaller for ScriptedCaller {
	fn api_call<'a>(&'a self, facade: &'a str, version: u32, id: &'a str, method: &'a str, args: Value) -> BoxFuture<'a, Result<Value>> {
		self.calls.lock().push(RecordedCall {
			facade: facade.to_string(),
			version,
			id: id.to_string(),
			method: method.to_string(),
			args,
		});
		let response = self
			.responses
			.lock()
			.pop_front()
			.unwrap_or_else(|| Err(Error::Transport(format!("no scripted response for {facade}.{method}"))));
		Box::pin(async move { response })
	}

	fn close(&self) -> BoxFuture<'_, Result<()>> {
		self.closes.fetch_add(1, Ordering::SeqCst);
		Box::pin(async { Ok(()) })
	}
}

/// Discharger that stores the challenge macaroon plus a fake discharge in a jar.
pub struct StoringDischarger {
	pub jar: Arc<MemoryJar>,
	pub challenges: Mutex<Vec<DischargeChallenge>>,
	pub fail: bool,
}

impl StoringDischarger {
	pub fn new(jar: Arc<MemoryJar>) -> Arc<Self> {
		Arc::new(Self {
			jar,
			challenges: Mutex::new(Vec::new()),
			fail: false,
		})
	}

	pub fn failing(jar: Arc<MemoryJar>) -> Arc<Self> {
		Arc::new(Self {
			jar,
			challenges: Mutex::new(Vec::new()),
			fail: true,
		})
	}
}

impl DischargeHandler for StoringDischarger {
	fn handle<'a>(&'a self, cookie_url: &'a Url, challenge: &'a DischargeChallenge) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.challenges.lock().push(challenge.clone());
			if self.fail {
				return Err(Error::Transport("identity service unreachable".into()));
			}
			let discharge = Macaroon::new(json!({ "identifier": "discharge" }));
			self.jar.add(cookie_url, &challenge.path, vec![challenge.macaroon.clone(), discharge]);
			Ok(())
		})
	}
}

/// Bakery pairing a [`StoringDischarger`] with its jar.
pub fn storing_bakery() -> (BakeryClient, Arc<StoringDischarger>, Arc<MemoryJar>) {
	let jar = Arc::new(MemoryJar::new());
	let discharger = StoringDischarger::new(Arc::clone(&jar));
	(BakeryClient::new(discharger.clone(), jar.clone()), discharger, jar)
}

/// A successful login result naming the given servers and facades.
pub fn login_ok(servers: Value, facades: Value) -> Value {
	json!({
		"servers": servers,
		"model-tag": format!("model-{MODEL_UUID}"),
		"controller-tag": format!("controller-{CONTROLLER_UUID}"),
		"facades": facades,
		"server-version": "2.0.1",
	})
}

/// A discharge-required login result.
pub fn discharge_required(identifier: &str, reason: &str) -> Value {
	json!({
		"discharge-required": { "identifier": identifier },
		"discharge-required-error": reason,
	})
}

pub fn host_port(host: &str, port: u16) -> Value {
	json!({ "value": host, "type": "ipv4", "scope": "public", "port": port })
}

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}
