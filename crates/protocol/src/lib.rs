//! Wire types for the controller Admin API.
//!
//! This crate contains the serde-serializable types exchanged with the API
//! server during session establishment. They are the shapes of data as they
//! appear on the wire and carry no behavior beyond small conversions.
//!
//! Higher-level handling (login retries, address ordering, facade version
//! negotiation) lives in `ctrl-runtime`.

pub mod host_port;
pub mod login;
pub mod macaroon;

pub use host_port::*;
pub use login::*;
pub use macaroon::*;
