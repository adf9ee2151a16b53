/// Errors that can occur while building or exchanging frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The identity and body do not fit in the 32-bit size field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A text field is not plain ASCII or contains an interior NUL.
    #[error("{field} must be ASCII without NUL bytes")]
    InvalidText { field: &'static str },

    /// An ASIC index outside the addressable range.
    #[error("ASIC {0} is out of range (1..=16)")]
    InvalidAsic(u8),

    /// A parameter code that does not fit in 24 bits.
    #[error("parameter code {0:#x} does not fit in 24 bits")]
    ParameterCodeOutOfRange(u32),

    /// More parameters than the 16-bit count field can describe.
    #[error("too many parameters in one request ({0}, max 65535)")]
    TooManyParameters(usize),

    /// An I/O error occurred while writing a frame or reading an acknowledgement.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The dispatcher closed the connection.
    #[error("connection closed by dispatcher")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Integrity complaints recorded while parsing an inbound buffer.
///
/// These are never returned as `Err`; the parser collects them next to the
/// packets it managed to extract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A start or end marker is missing or wrong.
    #[error("framing error at offset {offset}: expected {expected:#04x}, found {found}")]
    Framing {
        offset: usize,
        expected: u8,
        found: FoundByte,
    },

    /// The buffer ends before the frame it declares.
    #[error("truncated buffer at offset {offset}: frame needs {needed} bytes, {available} available")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The identity byte or subID is not in any lookup table.
    #[error("unknown identifier at offset {offset}: {label}")]
    UnknownIdentifier { offset: usize, label: String },
}

/// The byte actually seen where a marker was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoundByte {
    Byte(u8),
    EndOfBuffer,
}

impl std::fmt::Display for FoundByte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FoundByte::Byte(b) => write!(f, "{b:#04x}"),
            FoundByte::EndOfBuffer => write!(f, "end of buffer"),
        }
    }
}
