//! Client connections to a controller's administrative API.
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use ctrl::{BakeryClient, Conn, ConnectionInfo};
//!
//! let info = ConnectionInfo::load(path)?.expect("connection info");
//! let conn = Conn::new(info, Arc::new(my_dialer), BakeryClient::default())?;
//! let state = conn.state().await?;
//! let client = state.client()?;
//! let status: serde_json::Value = client.call("FullStatus", serde_json::json!({})).await?;
//! conn.close().await?;
//! ```
//!
//! [`open`] performs a single dial and login. [`Conn`] wraps it in a
//! session guard so that concurrent users share one logged-in state, and
//! pushes the configured secrets into the model whenever a new state opens.

pub mod config;
pub mod conn;
pub mod dial;
pub mod error;
pub mod logging;

pub use config::{CONNECTION_INFO_SCHEMA_VERSION, ConnectionInfo};
pub use conn::{ApiConnector, Conn};
pub use ctrl_protocol::{HostPort, Macaroon, MacaroonSlice, ServerGroups};
pub use ctrl_runtime::{
	AdminVersion, ApiCaller, ApiState, BakeryClient, BoxFuture, DischargeChallenge, DischargeHandler, Error, Facade, MemoryJar, NoDischarger, Number,
	SessionGuard, SessionProvider, Tag, TagKind, TokenCache,
};
pub use dial::{Dialer, open};
pub use error::{ConnError, Result};
pub use logging::init_logging;
