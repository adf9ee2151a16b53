//! Parameter tables, transfer functions and telemetry interpretation.
//!
//! Turns the raw body of a parameter-telemetry frame into numbers, physical
//! quantities, enumerated labels or text, depending on which parameter it
//! answers. Like the frame parser, nothing here fails on bad input:
//! problems are collected next to the best-effort result.

pub mod correlate;
pub mod error;
pub mod interpret;
pub mod lookup;
pub mod parameter;
pub mod transfer;

pub use correlate::{correlate, Correlation, ParameterReading};
pub use error::InterpretError;
pub use interpret::{decode_latin1, decode_numbers, interpret, Interpretation, RawValues};
pub use lookup::{CodeTable, DacShape, RelayState, DAC_SHAPES, RELAY_STATES};
pub use parameter::{
    descriptor, descriptor_by_code, ParameterDescriptor, ParameterKind, PARAMETERS,
};
pub use transfer::{
    adu_to_voffset, voffset_to_adu, TransferFunction, TESDAC_AMPLITUDE, TESDAC_FREQUENCY, VOFFSET,
};
