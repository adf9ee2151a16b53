//! Pairing parameter-telemetry packets with the names that were requested.
//!
//! Pairing is positional: the Nth parameter packet in the acknowledgement
//! answers the Nth requested name. Nothing inside the packet names the
//! parameter, so a dropped or reordered packet shifts every later answer
//! onto the wrong name. Count mismatches are reported; silent shifts cannot
//! be detected.

use dispatchwire_frame::Packet;
use serde::Serialize;
use tracing::warn;

use crate::error::InterpretError;
use crate::interpret::{interpret, Interpretation};

/// One requested parameter and the packet that answered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterReading {
    pub counter: u16,
    pub tag: Option<u8>,
    pub value: Interpretation,
}

/// Readings in request order plus any count mismatches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Correlation {
    pub readings: Vec<ParameterReading>,
    pub errors: Vec<InterpretError>,
}

impl Correlation {
    /// Reading for `name`, if it was answered.
    pub fn get(&self, name: &str) -> Option<&ParameterReading> {
        self.readings.iter().find(|r| r.value.parameter == name)
    }
}

/// Pair parameter packets with `requested` names by position.
///
/// Packets that are not parameter telemetry (acknowledgements, science
/// data) are skipped.
pub fn correlate<S: AsRef<str>>(requested: &[S], packets: &[Packet]) -> Correlation {
    let mut out = Correlation::default();
    let mut answers = packets.iter().filter(|p| p.is_parameter_telemetry());

    for (position, name) in requested.iter().enumerate() {
        let name = name.as_ref();
        match answers.next() {
            Some(packet) => out.readings.push(ParameterReading {
                counter: packet.counter,
                tag: packet.tag,
                value: interpret(name, &packet.body),
            }),
            None => out.errors.push(InterpretError::UnansweredParameter {
                parameter: name.to_string(),
                position,
            }),
        }
    }

    for (extra, packet) in answers.enumerate() {
        out.errors.push(InterpretError::UnrequestedPacket {
            position: requested.len() + extra,
            counter: packet.counter,
        });
    }

    if !out.errors.is_empty() {
        warn!(
            requested = requested.len(),
            answered = out.readings.len(),
            "parameter answers do not line up with the request"
        );
    }
    out
}
