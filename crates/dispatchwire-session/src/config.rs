use std::time::Duration;

use dispatchwire_frame::{FrameConfig, DEFAULT_MAX_ACK_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default dispatcher address.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:3002";

/// Default pause between writing a command and reading its acknowledgement.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Connection settings for a [`crate::Session`].
///
/// Durations are written as human-readable strings in JSON (`"500ms"`,
/// `"1s"`). Missing fields take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// `host:port` of the dispatcher.
    pub address: String,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// How long to wait for an acknowledgement before giving up.
    #[serde(with = "humantime_serde")]
    pub receive_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
    /// Pause after each write so the dispatcher can batch its answer.
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    /// Largest acknowledgement taken in one read.
    pub max_ack_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            connect_timeout: Duration::from_millis(500),
            receive_timeout: Duration::from_millis(500),
            write_timeout: Duration::from_millis(500),
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_ack_size: DEFAULT_MAX_ACK_SIZE,
        }
    }
}

impl SessionConfig {
    /// Defaults pointed at `address`.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Parse from a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reader/writer settings derived from this config.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_ack_size: self.max_ack_size,
            read_timeout: Some(self.receive_timeout),
            write_timeout: Some(self.write_timeout),
        }
    }
}
