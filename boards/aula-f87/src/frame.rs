//! 20-byte HID frame codec.
//!
//! Frame structure:
//! - Byte 0: 0x13 (report id)
//! - Byte 1: Command byte
//! - Byte 2: Sub-command byte
//! - Byte 3: Sequence number (fragment index)
//! - Bytes 4-18: Payload (15 bytes, zero padded)
//! - Byte 19: Checksum (sum of bytes 0-18, mod 256)

use std::fmt;
use std::str::FromStr;

use aula_ctl_core::{Error, Result};

/// Total length of a frame on the wire
pub const FRAME_LEN: usize = 20;
/// Length of the payload region
pub const PAYLOAD_LEN: usize = 15;
/// Offset of the first payload byte
pub const PAYLOAD_OFFSET: usize = 4;
/// Offset of the checksum byte
pub const CHECKSUM_OFFSET: usize = 19;

/// Sum of bytes 0-18, mod 256
pub fn checksum(data: &[u8]) -> u8 {
    data.iter()
        .take(CHECKSUM_OFFSET)
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A single 20-byte report.
///
/// Every mutation through [`Frame::set`] recomputes the checksum, so a frame
/// built or edited here is always ready to send.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Build a frame, truncating the payload to 15 bytes
    pub fn build(cmd: u8, subcmd: u8, seq: u8, payload: &[u8]) -> Self {
        let mut buf = [0u8; FRAME_LEN];
        buf[0] = crate::abi::REPORT_ID;
        buf[1] = cmd;
        buf[2] = subcmd;
        buf[3] = seq;
        let len = payload.len().min(PAYLOAD_LEN);
        buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + len].copy_from_slice(&payload[..len]);
        buf[CHECKSUM_OFFSET] = checksum(&buf);
        Self(buf)
    }

    /// Wrap a received report. The checksum is not validated on receipt.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let buf: [u8; FRAME_LEN] = raw
            .try_into()
            .map_err(|_| Error::MalformedFrame(raw.len()))?;
        Ok(Self(buf))
    }

    /// Wrap raw bytes exactly as given, checksum included
    pub fn from_bytes(buf: [u8; FRAME_LEN]) -> Self {
        Self(buf)
    }

    #[inline]
    pub fn report_id(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn cmd(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn subcmd(&self) -> u8 {
        self.0[2]
    }

    #[inline]
    pub fn seq(&self) -> u8 {
        self.0[3]
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.0[PAYLOAD_OFFSET..CHECKSUM_OFFSET]
    }

    #[inline]
    pub fn checksum(&self) -> u8 {
        self.0[CHECKSUM_OFFSET]
    }

    /// Byte at an absolute frame offset
    #[inline]
    pub fn get(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    /// Set a byte at an absolute frame offset (0-18) and reseal.
    ///
    /// # Panics
    ///
    /// Panics if `offset` addresses the checksum byte or beyond.
    pub fn set(&mut self, offset: usize, value: u8) {
        assert!(offset < CHECKSUM_OFFSET, "offset {offset} is not writable");
        self.0[offset] = value;
        self.0[CHECKSUM_OFFSET] = checksum(&self.0);
    }

    /// Copy of this frame with a different command byte
    pub fn with_cmd(mut self, cmd: u8) -> Self {
        self.set(1, cmd);
        self
    }

    /// True if the stored checksum matches the frame contents
    pub fn is_sealed(&self) -> bool {
        self.checksum() == checksum(&self.0)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({self})")
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Frame {
    type Err = Error;

    /// Parse 40 hex digits. Spaces and colons are ignored and the checksum is
    /// kept as given.
    fn from_str(s: &str) -> Result<Self> {
        let hex: String = s.chars().filter(|c| !matches!(c, ' ' | ':')).collect();
        if hex.len() != FRAME_LEN * 2 || !hex.is_ascii() {
            return Err(Error::InvalidRaw(format!(
                "need {} hex chars ({FRAME_LEN} bytes), got {}",
                FRAME_LEN * 2,
                hex.chars().count()
            )));
        }
        let mut buf = [0u8; FRAME_LEN];
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| Error::InvalidRaw(format!("not hex: {s}")))?;
        }
        Ok(Self(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_layout() {
        let frame = Frame::build(0x04, 0x0A, 3, &[1, 2, 3]);
        assert_eq!(frame.report_id(), 0x13);
        assert_eq!(frame.cmd(), 0x04);
        assert_eq!(frame.subcmd(), 0x0A);
        assert_eq!(frame.seq(), 3);
        assert_eq!(&frame.payload()[..4], &[1, 2, 3, 0]);
        assert_eq!(frame.checksum(), 0x13 + 0x04 + 0x0A + 3 + 1 + 2 + 3);
    }

    #[test]
    fn checksum_wraps() {
        let frame = Frame::build(0xFF, 0xFF, 0xFF, &[0xFF; 15]);
        let sum: u32 = frame.as_bytes()[..19].iter().map(|b| *b as u32).sum();
        assert_eq!(frame.checksum() as u32, sum % 256);
    }

    #[test]
    fn checksum_holds_for_built_frames() {
        for seq in 0..40u8 {
            let payload: Vec<u8> = (0..15).map(|i| seq.wrapping_mul(31).wrapping_add(i)).collect();
            let frame = Frame::build(0x09, 0x25, seq, &payload);
            let sum: u32 = frame.as_bytes()[..19].iter().map(|b| *b as u32).sum();
            assert_eq!(frame.checksum() as u32, sum % 256);
        }
    }

    #[test]
    fn long_payload_is_truncated() {
        let frame = Frame::build(0x04, 0x0A, 0, &[0xAA; 32]);
        assert_eq!(frame.payload(), &[0xAA; 15]);
        assert!(frame.is_sealed());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(Frame::parse(&[0u8; 19]), Err(Error::MalformedFrame(19))));
        assert!(matches!(Frame::parse(&[0u8; 64]), Err(Error::MalformedFrame(64))));
        assert!(Frame::parse(&[0u8; 20]).is_ok());
    }

    #[test]
    fn parse_does_not_validate_checksum() {
        let mut raw = *Frame::build(0x44, 0x0A, 0, &[]).as_bytes();
        raw[19] = raw[19].wrapping_add(1);
        let frame = Frame::parse(&raw).unwrap();
        assert!(!frame.is_sealed());
    }

    #[test]
    fn set_reseals() {
        let mut frame = Frame::build(0x44, 0x0A, 0, &[0; 15]);
        frame.set(15, 21);
        assert_eq!(frame.get(15), 21);
        assert!(frame.is_sealed());
        let frame = frame.with_cmd(0x04);
        assert_eq!(frame.cmd(), 0x04);
        assert!(frame.is_sealed());
    }

    #[test]
    #[should_panic]
    fn set_refuses_checksum_byte() {
        Frame::build(0, 0, 0, &[]).set(19, 0);
    }

    #[test]
    fn display_is_hex() {
        let frame = Frame::build(0x0A, 0x01, 0, &[0x04, 0x07]);
        assert_eq!(frame.to_string(), "130a010004070000000000000000000000000029");
    }

    #[test]
    fn parse_hex() {
        let frame: Frame = "13 0a 01 00:04 07 00000000000000000000000000 29".parse().unwrap();
        assert_eq!(frame, crate::abi::save());
        assert_eq!(frame.cmd(), 0x0A);

        // checksum kept verbatim
        let unsealed: Frame = "130a0100040700000000000000000000000000ff".parse().unwrap();
        assert!(!unsealed.is_sealed());
        assert_eq!(unsealed.checksum(), 0xFF);

        assert!(matches!("130a01".parse::<Frame>(), Err(Error::InvalidRaw(_))));
        assert!(matches!("zz0a0100040700000000000000000000000000ff".parse::<Frame>(), Err(Error::InvalidRaw(_))));
    }
}
