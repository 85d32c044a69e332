//! Lazily opened, shared session handle.
//!
//! [`SessionGuard`] opens its session on first use and hands the same handle
//! to every later caller. Opening and the setup that follows it run under one
//! async mutex, so concurrent callers never observe a session whose setup is
//! still in progress or has failed.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::connection::BoxFuture;
use crate::error::{Error, Result};

/// Opens, prepares, and closes the sessions managed by a [`SessionGuard`].
pub trait SessionProvider: Send + Sync {
	type Session: Send + Sync + 'static;

	/// Establishes a new session.
	fn open(&self) -> BoxFuture<'_, Result<Self::Session>>;

	/// Prepares a freshly opened session before anyone else can see it.
	fn setup<'a>(&'a self, session: &'a Self::Session) -> BoxFuture<'a, Result<()>>;

	/// Tears a session down.
	fn close<'a>(&'a self, session: &'a Self::Session) -> BoxFuture<'a, Result<()>>;
}

/// Owns at most one session of a [`SessionProvider`].
pub struct SessionGuard<P: SessionProvider> {
	provider: P,
	session: Mutex<Option<Arc<P::Session>>>,
}

impl<P: SessionProvider> SessionGuard<P> {
	pub fn new(provider: P) -> Self {
		Self {
			provider,
			session: Mutex::new(None),
		}
	}

	pub fn provider(&self) -> &P {
		&self.provider
	}

	/// Returns the session, opening and setting it up if there is none.
	///
	/// If setup fails the new session is closed and forgotten, so the next
	/// call starts over with a fresh `open`.
	pub async fn ensure_session(&self) -> Result<Arc<P::Session>> {
		let mut slot = self.session.lock().await;
		if let Some(session) = slot.as_ref() {
			return Ok(Arc::clone(session));
		}

		debug!(target: "ctrl.session", "opening session");
		let session = self.provider.open().await?;
		if let Err(err) = self.provider.setup(&session).await {
			debug!(target: "ctrl.session", error = %err, "session setup failed; closing");
			let close_error = self.provider.close(&session).await.err().map(Box::new);
			return Err(Error::SetupAfterOpen {
				source: Box::new(err),
				close_error,
			});
		}

		let session = Arc::new(session);
		*slot = Some(Arc::clone(&session));
		Ok(session)
	}

	/// Returns the current session without opening one.
	pub async fn current(&self) -> Option<Arc<P::Session>> {
		self.session.lock().await.clone()
	}

	/// Forgets the current session and closes it. A no-op without one.
	pub async fn release(&self) -> Result<()> {
		let mut slot = self.session.lock().await;
		match slot.take() {
			Some(session) => {
				debug!(target: "ctrl.session", "closing session");
				self.provider.close(&session).await
			}
			None => Ok(()),
		}
	}
}
