use serde::Serialize;

/// Problems recorded while interpreting parameter telemetry.
///
/// Like the parser's complaints these travel next to the decoded value and
/// are never returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpretError {
    /// A string parameter whose last byte is not NUL.
    #[error("{parameter}: string is not NUL-terminated (last byte {found:?})")]
    StringTermination {
        parameter: String,
        found: Option<u8>,
    },

    /// The name is not in the parameter table.
    #[error("unknown parameter {parameter}")]
    UnknownParameter { parameter: String },

    /// A requested parameter got no answer.
    #[error("no answer for parameter {parameter} (position {position})")]
    UnansweredParameter { parameter: String, position: usize },

    /// A parameter packet arrived beyond the end of the request list.
    #[error("parameter packet {position} (counter {counter}) answers nothing that was requested")]
    UnrequestedPacket { position: usize, counter: u16 },
}
