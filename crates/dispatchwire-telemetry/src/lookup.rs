//! Fixed code tables for enumerated parameters.

use serde::Serialize;

/// A table of code → label for one enumerated parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeTable {
    pub name: &'static str,
    pub entries: &'static [(u32, &'static str)],
}

impl CodeTable {
    /// Label for `code`, or `"unknown code N"`.
    pub fn label(&self, code: u32) -> String {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| (*label).to_string())
            .unwrap_or_else(|| format!("unknown code {code}"))
    }

    /// True when `code` is in the table.
    pub fn contains(&self, code: u32) -> bool {
        self.entries.iter().any(|(c, _)| *c == code)
    }
}

/// TES bias DAC waveforms.
pub const DAC_SHAPES: CodeTable = CodeTable {
    name: "dac_shape",
    entries: &[(0, "sinus"), (1, "triangle"), (2, "continuous")],
};

/// Relay positions.
pub const RELAY_STATES: CodeTable = CodeTable {
    name: "relay_state",
    entries: &[(0, "open"), (1, "closed")],
};

/// TES bias DAC waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DacShape {
    Sinus,
    Triangle,
    Continuous,
}

impl DacShape {
    /// Wire code.
    pub fn code(self) -> u8 {
        match self {
            DacShape::Sinus => 0,
            DacShape::Triangle => 1,
            DacShape::Continuous => 2,
        }
    }

    /// Shape for a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(DacShape::Sinus),
            1 => Some(DacShape::Triangle),
            2 => Some(DacShape::Continuous),
            _ => None,
        }
    }
}

/// Relay position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayState {
    Open,
    Closed,
}

impl RelayState {
    /// Wire code.
    pub fn code(self) -> u8 {
        match self {
            RelayState::Open => 0,
            RelayState::Closed => 1,
        }
    }

    /// State for a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RelayState::Open),
            1 => Some(RelayState::Closed),
            _ => None,
        }
    }
}
