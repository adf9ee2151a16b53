use std::time::Duration;

/// Errors that can occur while talking to the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (resolve, connect, socket options).
    #[error("transport error: {0}")]
    Transport(#[from] dispatchwire_transport::TransportError),

    /// Frame-level error raised before anything reached the socket.
    #[error("frame error: {0}")]
    Frame(#[from] dispatchwire_frame::FrameError),

    /// No connection is open.
    #[error("not connected to the dispatcher; subscribe again")]
    NotConnected,

    /// The dispatcher did not answer within the receive timeout. The
    /// connection has been dropped.
    #[error("no acknowledgement within {timeout:?}; subscribe again")]
    NoAcknowledgement { timeout: Duration },

    /// The socket failed mid-exchange. The connection has been dropped.
    #[error("dispatcher disconnected: {0}")]
    Disconnected(String),

    /// A parameter name missing from the parameter table.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// JSON configuration error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Another thread panicked while holding the shared session.
    #[error("shared session lock poisoned")]
    LockPoisoned,
}

impl SessionError {
    /// True when the error left the session disconnected.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            SessionError::NotConnected
                | SessionError::NoAcknowledgement { .. }
                | SessionError::Disconnected(_)
                | SessionError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
