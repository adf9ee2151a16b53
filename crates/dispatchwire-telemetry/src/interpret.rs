use serde::Serialize;
use tracing::debug;

use crate::error::InterpretError;
use crate::parameter::{descriptor, ParameterKind};

/// Number of ASIC slots in a per-ASIC parameter body.
pub const ASIC_SLOTS: usize = 16;

/// Raw numbers decoded from a body, keyed on its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "width", content = "values", rename_all = "snake_case")]
pub enum RawValues {
    /// 32-byte body: one little-endian u16 per ASIC slot.
    U16(Vec<u16>),
    /// 64-byte body: one little-endian u32 per ASIC slot.
    U32(Vec<u32>),
    /// Anything else, byte by byte.
    U8(Vec<u8>),
}

impl RawValues {
    /// Values widened to u32, in order.
    pub fn to_u32(&self) -> Vec<u32> {
        match self {
            RawValues::U16(v) => v.iter().map(|&x| u32::from(x)).collect(),
            RawValues::U32(v) => v.clone(),
            RawValues::U8(v) => v.iter().map(|&x| u32::from(x)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawValues::U16(v) => v.len(),
            RawValues::U32(v) => v.len(),
            RawValues::U8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded parameter body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub parameter: String,
    pub numbers: RawValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub errors: Vec<InterpretError>,
}

/// Decode `body` as the value of parameter `name`. Never fails.
///
/// Unknown names fall back to plain numbers and record an
/// `UnknownParameter` complaint.
pub fn interpret(name: &str, body: &[u8]) -> Interpretation {
    let mut out = Interpretation {
        parameter: name.to_string(),
        numbers: decode_numbers(body),
        physical: None,
        unit: None,
        labels: None,
        text: None,
        errors: Vec::new(),
    };

    let Some(desc) = descriptor(name) else {
        debug!(parameter = name, "interpreting unknown parameter as raw numbers");
        out.errors.push(InterpretError::UnknownParameter {
            parameter: name.to_string(),
        });
        return out;
    };

    match desc.kind {
        ParameterKind::Text => {
            out.numbers = RawValues::U8(body.to_vec());
            let (text, err) = decode_latin1(name, body);
            out.text = Some(text);
            out.errors.extend(err);
        }
        ParameterKind::Enumerated(table) => {
            out.labels = Some(
                out.numbers
                    .to_u32()
                    .into_iter()
                    .map(|code| table.label(code))
                    .collect(),
            );
        }
        ParameterKind::Numeric => {}
    }

    if let Some(tf) = desc.transfer {
        out.physical = Some(
            out.numbers
                .to_u32()
                .into_iter()
                .map(|raw| tf.to_physical(raw))
                .collect(),
        );
        out.unit = Some(tf.unit);
    }

    out
}

/// Decode raw numbers: 32 bytes → 16 × u16 LE, 64 bytes → 16 × u32 LE,
/// otherwise one value per byte.
pub fn decode_numbers(body: &[u8]) -> RawValues {
    match body.len() {
        n if n == ASIC_SLOTS * 2 => RawValues::U16(
            body.chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        n if n == ASIC_SLOTS * 4 => RawValues::U32(
            body.chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        _ => RawValues::U8(body.to_vec()),
    }
}

/// Decode Latin-1 text ending in NUL.
///
/// Without the terminator the last byte is dropped anyway and a
/// `StringTermination` complaint is returned.
pub fn decode_latin1(parameter: &str, body: &[u8]) -> (String, Option<InterpretError>) {
    let Some((&last, head)) = body.split_last() else {
        return (
            String::new(),
            Some(InterpretError::StringTermination {
                parameter: parameter.to_string(),
                found: None,
            }),
        );
    };

    let text = head.iter().map(|&b| char::from(b)).collect();
    let err = (last != 0).then(|| InterpretError::StringTermination {
        parameter: parameter.to_string(),
        found: Some(last),
    });
    (text, err)
}
