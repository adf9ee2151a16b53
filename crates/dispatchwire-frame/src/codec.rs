use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Start-of-frame marker.
pub const STX: u8 = 0x55;

/// End-of-frame marker.
pub const ETX: u8 = 0xAA;

/// Preamble: STX (1) + counter (2) + size (4) = 7 bytes.
pub const PREAMBLE_SIZE: usize = 7;

/// Default upper bound for one acknowledgement read: 64 KiB.
pub const DEFAULT_MAX_ACK_SIZE: usize = 64 * 1024;

/// Per-session command counter.
///
/// The counter is informational: it is stamped into every preamble but the
/// dispatcher's acknowledgement is not matched against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCounter(u16);

impl CommandCounter {
    /// A counter whose next value is 1.
    pub fn new() -> Self {
        Self(0)
    }

    /// A counter resuming after `last`.
    pub fn starting_after(last: u16) -> Self {
        Self(last)
    }

    /// Advance and return the new value, wrapping at 65536.
    pub fn advance(&mut self) -> u16 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    /// The value stamped into the most recent preamble.
    pub fn current(&self) -> u16 {
        self.0
    }
}

/// Build the 7-byte preamble for a command whose identity and body together
/// are `command_length` bytes long. Advances `counter`.
pub fn make_preamble(
    counter: &mut CommandCounter,
    command_length: usize,
) -> Result<[u8; PREAMBLE_SIZE]> {
    let size = checked_size(command_length)?;
    let value = counter.advance();
    let mut preamble = [0u8; PREAMBLE_SIZE];
    preamble[0] = STX;
    preamble[1..3].copy_from_slice(&value.to_be_bytes());
    preamble[3..7].copy_from_slice(&size.to_be_bytes());
    Ok(preamble)
}

/// Build a complete frame: preamble, identity, body, ETX. Advances `counter`.
pub fn make_packet(counter: &mut CommandCounter, id: u8, body: &[u8]) -> Result<Bytes> {
    let preamble = make_preamble(counter, 1 + body.len())?;
    let mut dst = BytesMut::with_capacity(PREAMBLE_SIZE + 1 + body.len() + 1);
    dst.put_slice(&preamble);
    dst.put_u8(id);
    dst.put_slice(body);
    dst.put_u8(ETX);
    Ok(dst.freeze())
}

fn checked_size(command_length: usize) -> Result<u32> {
    u32::try_from(command_length).map_err(|_| FrameError::PayloadTooLarge {
        size: command_length,
        max: u32::MAX as usize,
    })
}

/// A frame with an explicit counter value.
///
/// Used where the counter is already known, such as a dispatcher building
/// acknowledgements. Outgoing commands go through [`make_packet`] instead so
/// the session counter advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// Counter stamped into the preamble.
    pub counter: u16,
    /// Identity byte.
    pub id: u8,
    /// Everything between the identity and ETX.
    pub body: Bytes,
}

impl CommandFrame {
    /// Create a new frame.
    pub fn new(counter: u16, id: u8, body: impl Into<Bytes>) -> Self {
        Self {
            counter,
            id,
            body: body.into(),
        }
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        PREAMBLE_SIZE + 1 + self.body.len() + 1
    }

    /// Encode the frame into `dst`.
    ///
    /// Wire format:
    /// ```text
    /// ┌──────┬───────────┬───────────┬──────┬──────────┬──────┐
    /// │ STX  │ Counter   │ Size      │ ID   │ Body     │ ETX  │
    /// │ 0x55 │ (2B BE)   │ (4B BE)   │ (1B) │ (N B)    │ 0xAA │
    /// └──────┴───────────┴───────────┴──────┴──────────┴──────┘
    /// Size = 1 + N
    /// ```
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let size = checked_size(1 + self.body.len())?;
        dst.reserve(self.wire_size());
        dst.put_u8(STX);
        dst.put_u16(self.counter);
        dst.put_u32(size);
        dst.put_u8(self.id);
        dst.put_slice(&self.body);
        dst.put_u8(ETX);
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode(&mut dst)?;
        Ok(dst.freeze())
    }
}

/// Configuration for the frame writer and acknowledgement reader.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest acknowledgement accepted by one read. Default: 64 KiB.
    pub max_ack_size: usize,
    /// Read timeout for the acknowledgement read.
    pub read_timeout: Option<Duration>,
    /// Write timeout for outgoing frames.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_ack_size: DEFAULT_MAX_ACK_SIZE,
            read_timeout: Some(Duration::from_millis(500)),
            write_timeout: Some(Duration::from_millis(500)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_layout() {
        let mut counter = CommandCounter::new();
        let preamble = make_preamble(&mut counter, 0x0102_0304).unwrap();
        assert_eq!(preamble, [STX, 0x00, 0x01, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn preamble_size_decodes_back() {
        let mut counter = CommandCounter::new();
        for len in [0usize, 1, 7, 255, 256, 65_535, 65_536, 1 << 24, u32::MAX as usize] {
            let preamble = make_preamble(&mut counter, len).unwrap();
            let size = u32::from_be_bytes([preamble[3], preamble[4], preamble[5], preamble[6]]);
            assert_eq!(size as usize, len);
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn preamble_rejects_oversized_length() {
        let mut counter = CommandCounter::new();
        let err = make_preamble(&mut counter, u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert_eq!(counter.current(), 0, "rejected preamble must not advance");
    }

    #[test]
    fn counter_is_monotonic() {
        let mut counter = CommandCounter::new();
        for expected in 1..=1000u16 {
            let preamble = make_preamble(&mut counter, 1).unwrap();
            assert_eq!(u16::from_be_bytes([preamble[1], preamble[2]]), expected);
        }
    }

    #[test]
    fn counter_wraps_at_65536() {
        let mut counter = CommandCounter::starting_after(65_534);
        let seen: Vec<u16> = (0..3)
            .map(|_| {
                let p = make_preamble(&mut counter, 1).unwrap();
                u16::from_be_bytes([p[1], p[2]])
            })
            .collect();
        assert_eq!(seen, vec![65_535, 0, 1]);
    }

    #[test]
    fn packet_layout() {
        let mut counter = CommandCounter::new();
        let packet = make_packet(&mut counter, 0xD1, &[0x00, 0x05, 0x12, 0x34]).unwrap();
        assert_eq!(
            packet.as_ref(),
            &[STX, 0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0xD1, 0x00, 0x05, 0x12, 0x34, ETX]
        );
    }

    #[test]
    fn packet_with_empty_body() {
        let mut counter = CommandCounter::new();
        let packet = make_packet(&mut counter, 0xB0, &[]).unwrap();
        assert_eq!(packet.len(), PREAMBLE_SIZE + 2);
        assert_eq!(&packet[3..7], &[0, 0, 0, 1]);
        assert_eq!(packet[packet.len() - 1], ETX);
    }

    #[test]
    fn command_frame_matches_make_packet() {
        let mut counter = CommandCounter::starting_after(41);
        let built = make_packet(&mut counter, 0xD0, b"abc").unwrap();
        let frame = CommandFrame::new(42, 0xD0, Bytes::from_static(b"abc"));
        assert_eq!(frame.to_bytes().unwrap(), built);
        assert_eq!(frame.wire_size(), built.len());
    }
}
