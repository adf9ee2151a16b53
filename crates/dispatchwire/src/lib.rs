//! Client side of a data-acquisition dispatcher protocol.
//!
//! Commands are framed with a start byte, a 16-bit counter and a 32-bit
//! size, then sent over TCP; acknowledgements and telemetry come back in the
//! same framing and are decoded into calibrated parameter values.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connection to the dispatcher
//! - [`frame`]: Frame assembly, command bodies and acknowledgement parsing
//! - [`telemetry`]: Parameter tables, transfer functions and body decoding
//! - [`session`]: Connection state, client operations and shared sessions (behind `session` feature)
//! - `logging`: `tracing-subscriber` setup (behind `logging` feature)

/// Re-export transport types.
pub mod transport {
    pub use dispatchwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use dispatchwire_frame::*;
}

/// Re-export telemetry types.
pub mod telemetry {
    pub use dispatchwire_telemetry::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use dispatchwire_session::*;
}

#[cfg(feature = "logging")]
pub mod logging;
