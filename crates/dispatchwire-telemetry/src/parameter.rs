use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::lookup::{CodeTable, DAC_SHAPES, RELAY_STATES};
use crate::transfer::{TransferFunction, TESDAC_AMPLITUDE, TESDAC_FREQUENCY, VOFFSET};

/// How a parameter's body is presented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "table", rename_all = "snake_case")]
pub enum ParameterKind {
    /// Per-ASIC numbers, optionally calibrated.
    Numeric,
    /// Latin-1 text terminated by NUL.
    Text,
    /// Codes mapped through a fixed table.
    Enumerated(CodeTable),
}

/// A named dispatcher parameter and its 24-bit request code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub code: u32,
    pub kind: ParameterKind,
    pub transfer: Option<TransferFunction>,
}

impl ParameterDescriptor {
    const fn numeric(name: &'static str, code: u32, transfer: Option<TransferFunction>) -> Self {
        Self {
            name,
            code,
            kind: ParameterKind::Numeric,
            transfer,
        }
    }

    const fn text(name: &'static str, code: u32) -> Self {
        Self {
            name,
            code,
            kind: ParameterKind::Text,
            transfer: None,
        }
    }

    const fn enumerated(name: &'static str, code: u32, table: CodeTable) -> Self {
        Self {
            name,
            code,
            kind: ParameterKind::Enumerated(table),
            transfer: None,
        }
    }
}

/// Every parameter the dispatcher can be asked about.
pub const PARAMETERS: &[ParameterDescriptor] = &[
    ParameterDescriptor::text("Dispatcher_Version", 0x00_0001),
    ParameterDescriptor::text("Platform_SerialNumber", 0x00_0002),
    ParameterDescriptor::text("Acquisition_Name", 0x00_0003),
    ParameterDescriptor::numeric("ASIC_Voffset", 0x01_0020, Some(VOFFSET)),
    ParameterDescriptor::numeric("ASIC_TESDAC_Amplitude", 0x01_0021, Some(TESDAC_AMPLITUDE)),
    ParameterDescriptor::numeric("ASIC_TESDAC_Frequency", 0x01_0022, Some(TESDAC_FREQUENCY)),
    ParameterDescriptor::enumerated("ASIC_TESDAC_Shape", 0x01_0023, DAC_SHAPES),
    ParameterDescriptor::numeric(
        "ASIC_Spol",
        0x01_0024,
        Some(TransferFunction::new(14.0 / 255.0, 0.0, "V")),
    ),
    ParameterDescriptor::enumerated("ASIC_Feedback_Relay", 0x01_0025, RELAY_STATES),
    ParameterDescriptor::numeric("ASIC_Nsample", 0x01_0026, None),
    ParameterDescriptor::numeric("ASIC_RawMask", 0x01_0027, None),
    ParameterDescriptor::numeric(
        "ASIC_Temperature",
        0x01_0030,
        Some(TransferFunction::new(0.0625, 0.0, "K")),
    ),
];

fn by_name() -> &'static HashMap<&'static str, &'static ParameterDescriptor> {
    static INDEX: OnceLock<HashMap<&'static str, &'static ParameterDescriptor>> = OnceLock::new();
    INDEX.get_or_init(|| PARAMETERS.iter().map(|p| (p.name, p)).collect())
}

/// Look up a parameter by name.
pub fn descriptor(name: &str) -> Option<&'static ParameterDescriptor> {
    by_name().get(name).copied()
}

/// Look up a parameter by its 24-bit code.
pub fn descriptor_by_code(code: u32) -> Option<&'static ParameterDescriptor> {
    PARAMETERS.iter().find(|p| p.code == code)
}
