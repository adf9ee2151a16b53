//! Command bodies for the dispatcher telecommands.
//!
//! Each builder returns the bytes that go between the identity byte and ETX;
//! wrap them with [`crate::make_packet`] to get a sendable frame.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::identity::intern;

/// Subsystem group addressed by frontend commands.
pub const FRONTEND_GROUP: u8 = 2;

/// Fixed trailer after every frontend payload.
pub const FRONTEND_SUFFIX: [u8; 2] = [0xFA, 0xDA];

/// Highest addressable ASIC (bit `16 + 7` is the top of the 24-bit mask).
pub const MAX_ASIC: u8 = 16;

/// Frontend subsystem holding the ASIC registers.
const ASIC_SUBSYSTEM: u16 = 0x0001;

/// Identifier of one data-acquisition run.
///
/// Derived from the low 16 bits of the Unix time in seconds when the run
/// was started, and sent again to stop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackupsId(pub u16);

impl BackupsId {
    /// Identifier for a run starting now.
    pub fn now() -> Self {
        backups_id_at(SystemTime::now())
    }

    /// MSB then LSB.
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

/// Identifier for a run starting at `time`. Times before the epoch map to 0.
pub fn backups_id_at(time: SystemTime) -> BackupsId {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    BackupsId((secs & 0xFFFF) as u16)
}

/// Body of the start-acquisition telecommand (identity `INTERN_TC`).
///
/// Layout: subID `0x0004`, backupsID, session name + NUL, comment + NUL.
pub fn make_start_acquisition_body(
    backups_id: BackupsId,
    session_name: &str,
    comment: &str,
) -> Result<Bytes> {
    check_text("session name", session_name)?;
    check_text("comment", comment)?;

    let mut body = BytesMut::with_capacity(4 + session_name.len() + comment.len() + 2);
    body.put_u16(intern::START_ACQUISITION);
    body.put_slice(&backups_id.to_be_bytes());
    body.put_slice(session_name.as_bytes());
    body.put_u8(0);
    body.put_slice(comment.as_bytes());
    body.put_u8(0);
    Ok(body.freeze())
}

/// Body of the stop-acquisition telecommand (identity `INTERN_TC`).
pub fn make_stop_acquisition_body(backups_id: BackupsId) -> Bytes {
    let mut body = BytesMut::with_capacity(4);
    body.put_u16(intern::STOP_ACQUISITION);
    body.put_slice(&backups_id.to_be_bytes());
    body.freeze()
}

/// Body of a parameter request or (un)subscription (identity `CONF_DISPATCHER`).
///
/// Layout: subID, count (2B BE), then one 24-bit BE code per parameter in
/// request order. Responses are matched back to these codes by position.
pub fn make_parameter_request_body(sub_id: u16, codes: &[u32]) -> Result<Bytes> {
    let count =
        u16::try_from(codes.len()).map_err(|_| FrameError::TooManyParameters(codes.len()))?;

    let mut body = BytesMut::with_capacity(4 + 3 * codes.len());
    body.put_u16(sub_id);
    body.put_u16(count);
    for &code in codes {
        if code > 0x00FF_FFFF {
            return Err(FrameError::ParameterCodeOutOfRange(code));
        }
        body.put_slice(&code.to_be_bytes()[1..]);
    }
    Ok(body.freeze())
}

/// Body of a custom telecommand (identity `CUSTOM_TC`).
pub fn make_custom_body(sub_id: u16, payload: &[u8]) -> Bytes {
    let mut body = BytesMut::with_capacity(2 + payload.len());
    body.put_u16(sub_id);
    body.put_slice(payload);
    body.freeze()
}

fn check_text(field: &'static str, text: &str) -> Result<()> {
    if text.is_ascii() && !text.as_bytes().contains(&0) {
        Ok(())
    } else {
        Err(FrameError::InvalidText { field })
    }
}

/// A set of selected ASICs.
///
/// ASIC `n` (1-based) is bit `n + 7` of a 24-bit word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsicMask(u32);

impl AsicMask {
    /// Mask selecting every ASIC in `asics`.
    pub fn from_asics(asics: &[u8]) -> Result<Self> {
        asics.iter().try_fold(Self::default(), |mask, &n| mask.with(n))
    }

    /// This mask with ASIC `n` added.
    pub fn with(self, n: u8) -> Result<Self> {
        if n == 0 || n > MAX_ASIC {
            return Err(FrameError::InvalidAsic(n));
        }
        Ok(Self(self.0 | 1 << (u32::from(n) + 7)))
    }

    /// The 24-bit word.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Wire form: three bytes, least significant first.
    pub fn to_le_bytes(self) -> [u8; 3] {
        let [b0, b1, b2, _] = self.0.to_le_bytes();
        [b0, b1, b2]
    }
}

/// Mask selecting every ASIC in `asics`.
pub fn asic_mask(asics: &[u8]) -> Result<AsicMask> {
    AsicMask::from_asics(asics)
}

/// A command for the frontend ASICs, carried by `SEND_TO_SUBSYSTEM`.
///
/// Register values are raw ADU codes; converting from volts or hertz is the
/// job of the telemetry transfer functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendCommand {
    /// TES bias DAC offset (sign-magnitude ADU).
    TesDacOffset { adu: u16 },
    /// TES bias DAC waveform.
    TesDacShape {
        shape: u8,
        amplitude: u16,
        frequency: u16,
    },
    /// Feedback relay state code.
    FeedbackRelay(u8),
    /// SQUID polarisation.
    Spol(u8),
    /// Samples per readout.
    Nsample(u16),
    /// Reset the selected ASICs. Carries no payload.
    Reset,
    /// Anything not covered above.
    Raw {
        subsys_id1: u16,
        subsys_id2: u8,
        payload: Bytes,
    },
}

impl FrontendCommand {
    /// `(subsysID1, subsysID2)` for this command.
    pub fn subsystem_ids(&self) -> (u16, u8) {
        match self {
            FrontendCommand::TesDacOffset { .. } => (ASIC_SUBSYSTEM, 0x20),
            FrontendCommand::TesDacShape { .. } => (ASIC_SUBSYSTEM, 0x21),
            FrontendCommand::FeedbackRelay(_) => (ASIC_SUBSYSTEM, 0x22),
            FrontendCommand::Spol(_) => (ASIC_SUBSYSTEM, 0x23),
            FrontendCommand::Nsample(_) => (ASIC_SUBSYSTEM, 0x24),
            FrontendCommand::Reset => (ASIC_SUBSYSTEM, 0x2F),
            FrontendCommand::Raw {
                subsys_id1,
                subsys_id2,
                ..
            } => (*subsys_id1, *subsys_id2),
        }
    }

    fn put_payload(&self, dst: &mut BytesMut) {
        match self {
            FrontendCommand::TesDacOffset { adu } => dst.put_u16_le(*adu),
            FrontendCommand::TesDacShape {
                shape,
                amplitude,
                frequency,
            } => {
                dst.put_u8(*shape);
                dst.put_u16_le(*amplitude);
                dst.put_u16_le(*frequency);
            }
            FrontendCommand::FeedbackRelay(code) | FrontendCommand::Spol(code) => {
                dst.put_u8(*code)
            }
            FrontendCommand::Nsample(n) => dst.put_u16_le(*n),
            FrontendCommand::Reset => {}
            FrontendCommand::Raw { payload, .. } => dst.put_slice(payload),
        }
    }
}

/// Body of a frontend command (identity `SEND_TO_SUBSYSTEM`).
///
/// ```text
/// group=2 | subsysID1 (2B BE) | ASIC mask (3B LE) | 0xAA 0x55 | subsysID2 | 0x00
///         | payload | 0xFA 0xDA
/// ```
pub fn frontend_body(mask: AsicMask, command: &FrontendCommand) -> Bytes {
    let (subsys_id1, subsys_id2) = command.subsystem_ids();
    let mut body = BytesMut::with_capacity(16);
    body.put_u8(FRONTEND_GROUP);
    body.put_u16(subsys_id1);
    body.put_slice(&mask.to_le_bytes());
    body.put_slice(&[0xAA, 0x55]);
    body.put_u8(subsys_id2);
    body.put_u8(0x00);
    command.put_payload(&mut body);
    body.put_slice(&FRONTEND_SUFFIX);
    body.freeze()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn backups_id_uses_low_16_bits() {
        let t = UNIX_EPOCH + Duration::from_secs(0x6543_2109);
        let id = backups_id_at(t);
        assert_eq!(id, BackupsId(0x2109));
        assert_eq!(id.to_be_bytes(), [0x21, 0x09]);
    }

    #[test]
    fn backups_id_before_epoch_is_zero() {
        let t = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(backups_id_at(t), BackupsId(0));
    }

    #[test]
    fn start_acquisition_layout() {
        let body = make_start_acquisition_body(BackupsId(0xBEEF), "obs1", "test").unwrap();
        let mut expected = vec![0x00, 0x04, 0xBE, 0xEF];
        expected.extend_from_slice(b"obs1\0test\0");
        assert_eq!(body.as_ref(), expected.as_slice());
    }

    #[test]
    fn start_acquisition_with_empty_strings() {
        let body = make_start_acquisition_body(BackupsId(1), "", "").unwrap();
        assert_eq!(body.as_ref(), &[0x00, 0x04, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn start_acquisition_rejects_bad_text() {
        let err = make_start_acquisition_body(BackupsId(1), "ob\0s", "").unwrap_err();
        assert!(matches!(err, FrameError::InvalidText { field: "session name" }));
        let err = make_start_acquisition_body(BackupsId(1), "obs", "café").unwrap_err();
        assert!(matches!(err, FrameError::InvalidText { field: "comment" }));
    }

    #[test]
    fn stop_acquisition_layout() {
        let body = make_stop_acquisition_body(BackupsId(0x0102));
        assert_eq!(body.as_ref(), &[0x00, 0x05, 0x01, 0x02]);
    }

    #[test]
    fn parameter_request_layout() {
        let body = make_parameter_request_body(0x0001, &[0x010020, 0x000001]).unwrap();
        assert_eq!(
            body.as_ref(),
            &[0x00, 0x01, 0x00, 0x02, 0x01, 0x00, 0x20, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn parameter_request_rejects_wide_code() {
        let err = make_parameter_request_body(0x0001, &[0x0100_0000]).unwrap_err();
        assert!(matches!(err, FrameError::ParameterCodeOutOfRange(0x0100_0000)));
    }

    #[test]
    fn custom_body_layout() {
        assert_eq!(
            make_custom_body(0x1234, b"xy").as_ref(),
            &[0x12, 0x34, b'x', b'y']
        );
    }

    #[test]
    fn asic_one_is_bit_eight() {
        assert_eq!(asic_mask(&[1]).unwrap().bits(), 0x100);
    }

    #[test]
    fn asics_or_together() {
        assert_eq!(asic_mask(&[1, 2]).unwrap().bits(), 0x100 | 0x200);
        assert_eq!(asic_mask(&[2, 1, 2]).unwrap().bits(), 0x300);
        assert_eq!(asic_mask(&[16]).unwrap().bits(), 0x80_0000);
    }

    #[test]
    fn asic_out_of_range() {
        assert!(matches!(asic_mask(&[0]), Err(FrameError::InvalidAsic(0))));
        assert!(matches!(asic_mask(&[17]), Err(FrameError::InvalidAsic(17))));
    }

    #[test]
    fn asic_mask_wire_order_is_little_endian() {
        let mask = asic_mask(&[9]).unwrap();
        assert_eq!(mask.bits(), 0x01_0000);
        assert_eq!(mask.to_le_bytes(), [0x00, 0x00, 0x01]);
    }

    #[test]
    fn frontend_layout() {
        let mask = asic_mask(&[1, 2]).unwrap();
        let body = frontend_body(mask, &FrontendCommand::TesDacOffset { adu: 0x8123 });
        assert_eq!(
            body.as_ref(),
            &[
                0x02, 0x00, 0x01, // group, subsysID1
                0x00, 0x03, 0x00, // ASIC mask
                0xAA, 0x55, 0x20, 0x00, // marker, subsysID2, pad
                0x23, 0x81, // payload
                0xFA, 0xDA,
            ]
        );
    }

    #[test]
    fn frontend_without_payload_keeps_suffix() {
        let mask = asic_mask(&[3]).unwrap();
        let body = frontend_body(mask, &FrontendCommand::Reset);
        assert_eq!(body.len(), 12);
        assert_eq!(&body[10..], &FRONTEND_SUFFIX);
        assert_eq!(body[8], 0x2F);
    }

    #[test]
    fn frontend_raw_command() {
        let mask = AsicMask::default();
        let cmd = FrontendCommand::Raw {
            subsys_id1: 0x0A0B,
            subsys_id2: 0x77,
            payload: Bytes::from_static(&[1, 2, 3]),
        };
        let body = frontend_body(mask, &cmd);
        assert_eq!(&body[1..3], &[0x0A, 0x0B]);
        assert_eq!(body[8], 0x77);
        assert_eq!(&body[10..13], &[1, 2, 3]);
    }
}
