//! AUX frame encoding and decoding.
//!
//! ```text
//! 0x3B | len | src | dst | cmd | payload… | checksum
//! ```
//!
//! `len` counts `src`, `dst`, `cmd` and the payload. The checksum is the
//! two's complement of the byte sum from `len` through the payload.

use crate::config::units::MAX_ENCODER_VALUE;
use crate::error::ProtocolError;

use super::ids::{CommandCode, DeviceId};

/// First byte of every frame.
pub const START_BYTE: u8 = 0x3B;

/// Largest payload carried by one frame.
pub const MAX_PAYLOAD: usize = 27;

/// Bytes in a frame besides the payload.
pub const FRAME_OVERHEAD: usize = 6;

/// Largest encoded frame.
pub const MAX_FRAME: usize = MAX_PAYLOAD + FRAME_OVERHEAD;

/// Frame payload storage.
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD>;

/// Encoded frame storage.
pub type FrameBuffer = heapless::Vec<u8, MAX_FRAME>;

/// Two's complement of the byte sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    (!sum).wrapping_add(1)
}

/// Pack an encoder value into three big-endian bytes.
///
/// Values are taken modulo 2^24.
pub fn pack_int3_steps(value: u32) -> [u8; 3] {
    let [_, hi, mid, lo] = (value & MAX_ENCODER_VALUE).to_be_bytes();
    [hi, mid, lo]
}

/// Unpack three big-endian bytes into an encoder value.
pub fn unpack_int3_steps(bytes: &[u8]) -> Result<u32, ProtocolError> {
    match bytes {
        [hi, mid, lo] => Ok(u32::from_be_bytes([0, *hi, *mid, *lo])),
        _ => Err(ProtocolError::UnexpectedPayload {
            expected: 3,
            actual: bytes.len(),
        }),
    }
}

/// One AUX bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxCommand {
    /// Command byte.
    pub command: CommandCode,
    /// Sender.
    pub source: DeviceId,
    /// Recipient.
    pub destination: DeviceId,
    /// Command data, at most [`MAX_PAYLOAD`] bytes.
    pub payload: Payload,
}

/// Result of decoding a frame whose checksum may be wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// The decoded message.
    pub command: AuxCommand,
    /// `Some` when the checksum byte did not match.
    pub checksum_error: Option<ProtocolError>,
}

impl AuxCommand {
    /// Command with no payload, sent from the application.
    pub fn new(command: CommandCode, destination: DeviceId) -> Self {
        Self {
            command,
            source: DeviceId::APP,
            destination,
            payload: Payload::new(),
        }
    }

    /// Command with a payload, sent from the application.
    pub fn with_payload(command: CommandCode, destination: DeviceId, payload: &[u8]) -> Result<Self, ProtocolError> {
        let payload = Payload::from_slice(payload).map_err(|_| ProtocolError::PayloadTooLong(payload.len()))?;
        Ok(Self {
            command,
            source: DeviceId::APP,
            destination,
            payload,
        })
    }

    /// Command carrying a 24-bit encoder value.
    pub fn with_steps(command: CommandCode, destination: DeviceId, steps: u32) -> Self {
        let mut payload = Payload::new();
        // Three bytes always fit.
        let _ = payload.extend_from_slice(&pack_int3_steps(steps));
        Self {
            command,
            source: DeviceId::APP,
            destination,
            payload,
        }
    }

    /// Command carrying a single byte.
    pub fn with_byte(command: CommandCode, destination: DeviceId, value: u8) -> Self {
        let mut payload = Payload::new();
        let _ = payload.push(value);
        Self {
            command,
            source: DeviceId::APP,
            destination,
            payload,
        }
    }

    /// Value of the length byte.
    pub fn length(&self) -> u8 {
        // Payload is bounded by MAX_PAYLOAD.
        (3 + self.payload.len()) as u8
    }

    /// Payload as a 24-bit encoder value.
    pub fn steps(&self) -> Result<u32, ProtocolError> {
        unpack_int3_steps(&self.payload)
    }

    /// True when `other` is this frame repeated back by a one-wire bus.
    pub fn is_echo_of(&self, other: &AuxCommand) -> bool {
        self.source == other.source && self.destination == other.destination && self.command == other.command
    }

    /// Serialize into a frame.
    pub fn encode(&self) -> FrameBuffer {
        let mut frame = FrameBuffer::new();
        // Capacity is MAX_PAYLOAD + FRAME_OVERHEAD, so none of these fail.
        let _ = frame.push(START_BYTE);
        let _ = frame.push(self.length());
        let _ = frame.push(self.source.0);
        let _ = frame.push(self.destination.0);
        let _ = frame.push(self.command.0);
        let _ = frame.extend_from_slice(&self.payload);
        let cs = checksum(&frame[1..]);
        let _ = frame.push(cs);
        frame
    }

    /// Parse a complete frame, rejecting checksum errors.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let decoded = Self::decode_lenient(frame)?;
        match decoded.checksum_error {
            Some(err) => Err(err),
            None => Ok(decoded.command),
        }
    }

    /// Parse a complete frame, reporting but tolerating checksum errors.
    pub fn decode_lenient(frame: &[u8]) -> Result<DecodedFrame, ProtocolError> {
        if frame.len() < FRAME_OVERHEAD {
            return Err(ProtocolError::FrameTooShort(frame.len()));
        }
        if frame[0] != START_BYTE {
            return Err(ProtocolError::InvalidStartByte(frame[0]));
        }

        let declared = usize::from(frame[1]);
        let actual = frame.len() - 3;
        if declared != actual || declared < 3 {
            return Err(ProtocolError::LengthMismatch { declared, actual });
        }

        let body = &frame[..frame.len() - 1];
        let payload = Payload::from_slice(&body[5..]).map_err(|_| ProtocolError::PayloadTooLong(body.len() - 5))?;
        let expected = checksum(&body[1..]);
        let received = frame[frame.len() - 1];

        Ok(DecodedFrame {
            command: AuxCommand {
                command: CommandCode(frame[4]),
                source: DeviceId(frame[2]),
                destination: DeviceId(frame[3]),
                payload,
            },
            checksum_error: (expected != received).then_some(ProtocolError::ChecksumMismatch {
                expected,
                actual: received,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_goto_fast() {
        let cmd = AuxCommand::with_steps(CommandCode::MC_GOTO_FAST, DeviceId::AZM, 0x12_3456);
        let frame = cmd.encode();
        assert_eq!(&frame[..8], &[0x3B, 0x06, 0x20, 0x10, 0x02, 0x12, 0x34, 0x56]);
        let sum: u32 = frame[1..].iter().map(|&b| u32::from(b)).sum();
        assert_eq!(sum & 0xFF, 0);
    }

    #[test]
    fn decode_inverts_encode() {
        let cmd = AuxCommand::with_byte(CommandCode::MC_MOVE_POS, DeviceId::ALT, 9);
        assert_eq!(AuxCommand::decode(&cmd.encode()).unwrap(), cmd);
    }

    #[test]
    fn checksum_mismatch_is_reported_but_tolerated() {
        let mut frame = AuxCommand::new(CommandCode::MC_SLEW_DONE, DeviceId::AZM).encode();
        let last = frame.len() - 1;
        frame[last] ^= 0x55;

        assert!(matches!(
            AuxCommand::decode(&frame),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
        let lenient = AuxCommand::decode_lenient(&frame).unwrap();
        assert_eq!(lenient.command.command, CommandCode::MC_SLEW_DONE);
        assert!(lenient.checksum_error.is_some());
    }

    #[test]
    fn lenient_decode_results_compare_equal() {
        let mut frame = AuxCommand::new(CommandCode::MC_GET_POSITION, DeviceId::ALT).encode();
        let last = frame.len() - 1;
        frame[last] ^= 0x01;

        let first = AuxCommand::decode_lenient(&frame);
        assert_eq!(first, AuxCommand::decode_lenient(&frame));
        assert_eq!(
            AuxCommand::decode_lenient(&frame[..2]),
            AuxCommand::decode_lenient(&frame[..2])
        );
        assert_ne!(first, AuxCommand::decode_lenient(&frame[..2]));
    }

    #[test]
    fn rejects_bad_framing() {
        assert_eq!(
            AuxCommand::decode(&[0x3C, 3, 0x20, 0x10, 0x01, 0]),
            Err(ProtocolError::InvalidStartByte(0x3C))
        );
        assert_eq!(AuxCommand::decode(&[0x3B, 3]), Err(ProtocolError::FrameTooShort(2)));
        assert!(matches!(
            AuxCommand::decode(&[0x3B, 5, 0x20, 0x10, 0x01, 0]),
            Err(ProtocolError::LengthMismatch { declared: 5, actual: 3 })
        ));
    }

    #[test]
    fn int3_packing() {
        assert_eq!(pack_int3_steps(0x00AB_CDEF), [0xAB, 0xCD, 0xEF]);
        assert_eq!(pack_int3_steps(0x0100_0001), [0x00, 0x00, 0x01]);
        assert_eq!(unpack_int3_steps(&[0xFF, 0xFF, 0xFF]), Ok(MAX_ENCODER_VALUE));
        assert!(unpack_int3_steps(&[1, 2]).is_err());
    }

    #[test]
    fn echo_detection() {
        let sent = AuxCommand::new(CommandCode::MC_GET_POSITION, DeviceId::AZM);
        let mut reply = sent.clone();
        reply.source = DeviceId::AZM;
        reply.destination = DeviceId::APP;
        assert!(sent.is_echo_of(&sent.clone()));
        assert!(!sent.is_echo_of(&reply));
    }
}
