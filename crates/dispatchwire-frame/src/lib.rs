//! STX/ETX command framing and acknowledgement parsing for the dispatcher
//! protocol.
//!
//! Every command sent to the dispatcher is framed as:
//! - `0x55` start byte
//! - a 2-byte big-endian command counter
//! - a 4-byte big-endian size covering the identity byte and the body
//! - a 1-byte identity, the body, and a `0xAA` end byte
//!
//! Acknowledgements come back in the same shape, possibly several frames
//! glued together in one buffer. [`parse_buffer`] splits them apart without
//! ever failing; integrity problems are reported next to the packets.

pub mod codec;
pub mod command;
pub mod error;
pub mod identity;
pub mod parser;
pub mod reader;
pub mod writer;

pub use codec::{
    make_packet, make_preamble, CommandCounter, CommandFrame, FrameConfig, DEFAULT_MAX_ACK_SIZE,
    ETX, PREAMBLE_SIZE, STX,
};
pub use command::{
    asic_mask, backups_id_at, frontend_body, make_custom_body, make_parameter_request_body,
    make_start_acquisition_body, make_stop_acquisition_body, AsicMask, BackupsId,
    FrontendCommand,
};
pub use error::{DecodeError, FoundByte, FrameError, Result};
pub use identity::{
    identity_class, identity_label, sub_id_label, IdentityClass, CONF_DISPATCHER, CUSTOM_TC,
    HOUSEKEEPING_TM, INTERN_TC, PARAMETER_TM, SCIENCE_TM, SEND_TO_SUBSYSTEM,
};
pub use parser::{parse_buffer, Packet, ParsedBuffer};
pub use reader::AckReader;
pub use writer::FrameWriter;
