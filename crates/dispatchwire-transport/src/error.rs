/// Errors that can occur in dispatcher transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The dispatcher address could not be resolved.
    #[error("failed to resolve {addr}: {source}")]
    Resolve {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to the dispatcher.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> std::io::ErrorKind {
        match self {
            TransportError::Resolve { source, .. } | TransportError::Connect { source, .. } => {
                source.kind()
            }
            TransportError::Io(err) => err.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
