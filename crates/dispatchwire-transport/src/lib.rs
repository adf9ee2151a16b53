//! Blocking TCP transport to an instrument-control dispatcher.
//!
//! This is the lowest layer of dispatchwire. It knows nothing about frames:
//! it resolves the dispatcher address, connects with a bounded timeout and
//! hands back a [`DispatcherStream`] that everything else builds on.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::DispatcherStream;
pub use tcp::{connect, connect_timeout};
