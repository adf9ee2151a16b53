//! Session layer for the dispatcher protocol.
//!
//! A [`Session`] owns the command counter and the TCP connection. Each
//! command is written whole, followed by a short settle delay and a single
//! bounded read for the acknowledgement. [`DispatcherClient`] builds the
//! acquisition, parameter and frontend commands on top of it, and
//! [`SharedSession`] serializes exchanges across threads.

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod shared;

#[cfg(test)]
mod testing;

pub use client::{CommandReply, DispatcherClient, ParameterReply};
pub use config::{SessionConfig, DEFAULT_ADDRESS, DEFAULT_SETTLE_DELAY};
pub use error::{Result, SessionError};
pub use session::{Session, SessionState};
pub use shared::SharedSession;
