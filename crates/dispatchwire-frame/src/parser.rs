use std::ops::RangeInclusive;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::codec::{ETX, PREAMBLE_SIZE, STX};
use crate::error::{DecodeError, FoundByte};
use crate::identity::{
    identity_class, identity_label, sub_id_label, IdentityClass, PARAMETER_TM,
};

/// One frame located inside an inbound buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Offset of the STX byte.
    pub start: usize,
    /// Offset of the ETX byte (or of the last buffer byte when truncated).
    pub end: usize,
    /// Counter from the preamble.
    pub counter: u16,
    /// Size declared in the preamble.
    pub size: u32,
    /// Identity byte, absent when the frame is too short to hold one.
    pub identity: Option<u8>,
    /// Namespace the identity was found in.
    pub class: IdentityClass,
    /// subID of command-class frames.
    pub sub_id: Option<u16>,
    /// Tag byte of telemetry-class frames.
    pub tag: Option<u8>,
    /// Offset of the first body byte in the parsed buffer.
    pub body_offset: usize,
    /// Bytes between the header fields and ETX.
    pub body: Bytes,
}

impl Packet {
    /// Byte range of the frame in the parsed buffer.
    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Identity name, or a fallback label for unregistered bytes.
    pub fn identity_name(&self) -> String {
        match self.identity {
            Some(id) => identity_label(id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("unknown identity {id:#04x}")),
            None => "no identity".to_string(),
        }
    }

    /// subID name, or a fallback label when the subID is not in a table.
    pub fn sub_id_name(&self) -> Option<String> {
        let (id, sub_id) = (self.identity?, self.sub_id?);
        Some(match sub_id_label(id, sub_id) {
            Some(Some(name)) => name.to_string(),
            Some(None) | None => format!("unknown subID {sub_id:#06x}"),
        })
    }

    /// True for frames carrying a parameter value.
    pub fn is_parameter_telemetry(&self) -> bool {
        self.identity == Some(PARAMETER_TM)
    }
}

/// Result of [`parse_buffer`]: best-effort packets plus integrity complaints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBuffer {
    pub packets: Vec<Packet>,
    pub errors: Vec<DecodeError>,
}

impl ParsedBuffer {
    /// True when no complaint was recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Packets carrying parameter values, in buffer order.
    pub fn parameter_packets(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter().filter(|p| p.is_parameter_telemetry())
    }

    fn complain(&mut self, err: DecodeError) {
        if !self.errors.contains(&err) {
            self.errors.push(err);
        }
    }
}

/// Split a buffer holding zero or more concatenated frames.
///
/// Never fails and never reads out of bounds. A frame whose declared size
/// runs past the buffer is clamped to the last byte and reported as
/// truncated; bad markers and unknown identities are reported and parsing
/// carries on.
pub fn parse_buffer(buf: impl Into<Bytes>) -> ParsedBuffer {
    let buf: Bytes = buf.into();
    let len = buf.len();
    let mut out = ParsedBuffer::default();

    if len == 0 {
        out.complain(DecodeError::Framing {
            offset: 0,
            expected: STX,
            found: FoundByte::EndOfBuffer,
        });
        return out;
    }

    if buf[0] != STX {
        out.complain(framing(0, STX, buf[0]));
    }
    if buf[len - 1] != ETX {
        out.complain(framing(len - 1, ETX, buf[len - 1]));
    }

    let mut offset = 0usize;
    while offset < len {
        if len - offset < PREAMBLE_SIZE {
            out.complain(DecodeError::TruncatedBuffer {
                offset,
                needed: PREAMBLE_SIZE,
                available: len - offset,
            });
            break;
        }
        if buf[offset] != STX {
            out.complain(framing(offset, STX, buf[offset]));
        }

        let counter = u16::from_be_bytes([buf[offset + 1], buf[offset + 2]]);
        let size = u32::from_be_bytes([
            buf[offset + 3],
            buf[offset + 4],
            buf[offset + 5],
            buf[offset + 6],
        ]);

        let declared_end = (offset + PREAMBLE_SIZE).saturating_add(size as usize);
        let end = if declared_end >= len {
            out.complain(DecodeError::TruncatedBuffer {
                offset,
                needed: declared_end.saturating_sub(offset).saturating_add(1),
                available: len - offset,
            });
            len - 1
        } else {
            declared_end
        };

        if buf[end] != ETX {
            out.complain(framing(end, ETX, buf[end]));
        }

        let packet = extract_packet(&buf, offset, end, counter, size, &mut out);
        debug!(
            counter = packet.counter,
            identity = %packet.identity_name(),
            size = packet.size,
            body_len = packet.body.len(),
            "parsed frame"
        );
        out.packets.push(packet);

        offset = end + 1;
    }

    if !out.is_clean() {
        warn!(
            complaints = out.errors.len(),
            packets = out.packets.len(),
            "inbound buffer failed integrity checks"
        );
    }
    out
}

fn extract_packet(
    buf: &Bytes,
    start: usize,
    end: usize,
    counter: u16,
    size: u32,
    out: &mut ParsedBuffer,
) -> Packet {
    let id_pos = start + PREAMBLE_SIZE;
    let mut packet = Packet {
        start,
        end,
        counter,
        size,
        identity: None,
        class: IdentityClass::Unknown,
        sub_id: None,
        tag: None,
        body_offset: end,
        body: Bytes::new(),
    };

    if id_pos >= end {
        return packet;
    }

    let id = buf[id_pos];
    packet.identity = Some(id);
    packet.class = identity_class(id);

    let body_start = match packet.class {
        IdentityClass::Command => {
            if id_pos + 2 < end {
                let sub_id = u16::from_be_bytes([buf[id_pos + 1], buf[id_pos + 2]]);
                packet.sub_id = Some(sub_id);
                if let Some(None) = sub_id_label(id, sub_id) {
                    out.complain(DecodeError::UnknownIdentifier {
                        offset: id_pos + 1,
                        label: format!("unknown subID {sub_id:#06x} under {id:#04x}"),
                    });
                }
            }
            id_pos + 3
        }
        IdentityClass::Telemetry => {
            if id_pos + 1 < end {
                packet.tag = Some(buf[id_pos + 1]);
            }
            id_pos + 2
        }
        IdentityClass::Unknown => {
            out.complain(DecodeError::UnknownIdentifier {
                offset: id_pos,
                label: format!("unknown identity {id:#04x}"),
            });
            id_pos + 1
        }
    };

    packet.body_offset = body_start.min(end);
    packet.body = buf.slice(packet.body_offset..end);
    packet
}

fn framing(offset: usize, expected: u8, found: u8) -> DecodeError {
    DecodeError::Framing {
        offset,
        expected,
        found: FoundByte::Byte(found),
    }
}
