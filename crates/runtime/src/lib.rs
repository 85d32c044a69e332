//! Controller API runtime - login handshake, address registry, and session lifecycle
//!
//! This crate sits between the RPC transport and the code that uses
//! individual API facades:
//!
//! - **Login**: `Admin.Login` with passwords or macaroons, including one
//!   discharge-and-retry round when the server asks for it
//! - **Address registry**: server address groups, reordered so the address
//!   that just worked is tried first next time
//! - **Facade versions**: the versions the server advertised, intersected
//!   with the ones this client speaks
//! - **Session guard**: a lazily opened, shared session with atomic setup
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  ctrl (core) │  configuration, dialing, environment connection
//! └──────┬───────┘
//!        │ SessionProvider / Dialer
//! ┌──────▼───────┐
//! │ ctrl-runtime │  This crate
//! │  ┌────────┐  │
//! │  │ State  │  │  Admin.Login + committed session
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Guard  │  │  open-once / setup / release
//! │  └────────┘  │
//! └──────┬───────┘
//!        │ ApiCaller
//!   RPC transport
//! ```

pub mod address;
pub mod bakery;
pub mod connection;
pub mod error;
pub mod facade;
pub mod session;
pub mod state;
pub mod tag;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use bakery::{BakeryClient, DischargeChallenge, DischargeHandler, MemoryJar, NoDischarger, TokenCache};
pub use connection::{ApiCaller, BoxFuture};
pub use error::{Error, Result};
pub use facade::{Facade, FacadeVersionTable};
pub use session::{SessionGuard, SessionProvider};
pub use state::{AdminVersion, ApiState, LoginSession};
pub use tag::{Tag, TagKind};
pub use version::Number;
