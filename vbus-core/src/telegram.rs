//! VBus telegram (protocol version 3.0) and its live wire format
//!
//! # Wire layout
//! ```text
//! 0      AA                      sync
//! 1..3   destination (LE, & 7F7F)
//! 3..5   source (LE, & 7F7F)
//! 5      30                      protocol version
//! 6      command (7 bit)
//! 7      checksum over 1..7
//! 8..    frame_count * (8 septet-encoded bytes + 1 checksum)
//! ```

use crate::checksum::{calc_and_set_checksum, ensure_septet_clean, verify_checksum};
use crate::error::{VbusError, VbusResult};
use crate::header::{ADDRESS_MASK, Header, SYNC_BYTE};
use crate::septet::{extract_septet, inject_septet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Protocol version of telegrams
pub const TELEGRAM_PROTOCOL_VERSION: u8 = 0x30;

/// Length of the telegram header on the wire, including its checksum
pub const TELEGRAM_HEADER_LENGTH: usize = 8;

/// Length of one frame on the wire (8 septet bytes + checksum)
pub const TELEGRAM_FRAME_LENGTH: usize = 9;

/// Payload bytes carried per frame
pub const BYTES_PER_FRAME: usize = 7;

/// Maximum number of frames in a telegram
pub const MAX_FRAME_COUNT: usize = 3;

/// Size of the frame data buffer, independent of the frame count
pub const FRAME_DATA_LENGTH: usize = MAX_FRAME_COUNT * BYTES_PER_FRAME;

/// Number of frames following a telegram header with the given command
pub fn frame_count_for_command(command: u8) -> usize {
    ((command >> 5) & 0x03) as usize
}

/// Wire length of a telegram with the given command
pub fn live_length_for_command(command: u8) -> usize {
    TELEGRAM_HEADER_LENGTH + frame_count_for_command(command) * TELEGRAM_FRAME_LENGTH
}

/// A VBus telegram
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Telegram {
    channel: u8,
    destination_address: u16,
    source_address: u16,
    command: u8,
    frame_data: [u8; FRAME_DATA_LENGTH],
}

impl Telegram {
    /// Create a telegram, copying up to 21 bytes of `frame_data`
    ///
    /// Bytes not provided by `frame_data` are zero.
    pub fn new(
        destination_address: u16,
        source_address: u16,
        command: u8,
        frame_data: &[u8],
    ) -> Self {
        let mut owned = [0u8; FRAME_DATA_LENGTH];
        let len = frame_data.len().min(FRAME_DATA_LENGTH);
        owned[..len].copy_from_slice(&frame_data[..len]);
        Self::with_frame_data(destination_address, source_address, command, owned)
    }

    /// Create a telegram taking ownership of an existing frame data buffer
    pub fn with_frame_data(
        destination_address: u16,
        source_address: u16,
        command: u8,
        frame_data: [u8; FRAME_DATA_LENGTH],
    ) -> Self {
        Self {
            channel: 0,
            destination_address,
            source_address,
            command,
            frame_data,
        }
    }

    /// Set the channel this telegram belongs to
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Get the command
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Get the full 21 byte frame data buffer
    pub fn frame_data(&self) -> &[u8; FRAME_DATA_LENGTH] {
        &self.frame_data
    }

    /// Get the frame data bytes that are valid for this command
    pub fn valid_frame_data(&self) -> &[u8] {
        &self.frame_data[..self.frame_count() * BYTES_PER_FRAME]
    }

    /// Number of frames derived from the command
    pub fn frame_count(&self) -> usize {
        frame_count_for_command(self.command)
    }

    /// Length of this telegram on the wire
    pub fn live_length(&self) -> usize {
        live_length_for_command(self.command)
    }

    /// Encode into a newly allocated buffer
    pub fn to_live_buffer(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.live_length()];
        self.encode_unchecked(&mut buf);
        buf
    }

    /// Encode into `buf[start..end]`, returning the number of bytes written
    ///
    /// Nothing is written if the range is too small.
    pub fn write_live_buffer(&self, buf: &mut [u8], start: usize, end: usize) -> VbusResult<usize> {
        let length = self.live_length();
        let end = end.min(buf.len());
        let available = end.saturating_sub(start);
        if available < length {
            return Err(VbusError::BufferTooSmall {
                needed: length,
                available,
            });
        }

        self.encode_unchecked(&mut buf[start..start + length]);
        Ok(length)
    }

    fn encode_unchecked(&self, buf: &mut [u8]) {
        buf[0] = SYNC_BYTE;
        buf[1..3].copy_from_slice(&(self.destination_address & ADDRESS_MASK).to_le_bytes());
        buf[3..5].copy_from_slice(&(self.source_address & ADDRESS_MASK).to_le_bytes());
        buf[5] = TELEGRAM_PROTOCOL_VERSION;
        buf[6] = self.command & 0x7F;
        calc_and_set_checksum(buf, 1, 7);

        for i in 0..self.frame_count() {
            let src_start = BYTES_PER_FRAME * i;
            let dst_start = TELEGRAM_HEADER_LENGTH + TELEGRAM_FRAME_LENGTH * i;
            extract_septet(
                &self.frame_data[src_start..src_start + BYTES_PER_FRAME],
                &mut buf[dst_start..dst_start + BYTES_PER_FRAME + 1],
            );
            calc_and_set_checksum(buf, dst_start, dst_start + BYTES_PER_FRAME + 1);
        }
    }

    /// Decode a telegram from `buf[start..end]`
    ///
    /// Validates the sync byte, protocol version, 7-bit cleanliness and all
    /// checksums. Never reads past `end`.
    pub fn from_live_buffer(buf: &[u8], start: usize, end: usize) -> VbusResult<Self> {
        let end = end.min(buf.len());
        let available = end.saturating_sub(start);
        if available < TELEGRAM_HEADER_LENGTH {
            return Err(VbusError::Truncated {
                needed: TELEGRAM_HEADER_LENGTH,
                available,
            });
        }

        if buf[start] != SYNC_BYTE {
            return Err(VbusError::FrameInvalid(format!(
                "Expected sync byte 0xAA, but received: 0x{:02X}",
                buf[start]
            )));
        }
        ensure_septet_clean(buf, start + 1, start + TELEGRAM_HEADER_LENGTH)?;
        verify_checksum(buf, start + 1, start + 7)?;

        let protocol_version = buf[start + 5];
        if protocol_version != TELEGRAM_PROTOCOL_VERSION {
            return Err(VbusError::UnsupportedProtocolVersion(protocol_version));
        }

        let command = buf[start + 6];
        let length = live_length_for_command(command);
        if available < length {
            return Err(VbusError::Truncated {
                needed: length,
                available,
            });
        }

        let mut frame_data = [0u8; FRAME_DATA_LENGTH];
        for i in 0..frame_count_for_command(command) {
            let src_start = start + TELEGRAM_HEADER_LENGTH + TELEGRAM_FRAME_LENGTH * i;
            let dst_start = BYTES_PER_FRAME * i;
            ensure_septet_clean(buf, src_start, src_start + TELEGRAM_FRAME_LENGTH)?;
            verify_checksum(buf, src_start, src_start + BYTES_PER_FRAME + 1)?;
            inject_septet(
                &buf[src_start..src_start + BYTES_PER_FRAME + 1],
                &mut frame_data[dst_start..dst_start + BYTES_PER_FRAME],
            );
        }

        Ok(Self::with_frame_data(
            u16::from_le_bytes([buf[start + 1], buf[start + 2]]),
            u16::from_le_bytes([buf[start + 3], buf[start + 4]]),
            command,
            frame_data,
        ))
    }
}

impl Header for Telegram {
    fn channel(&self) -> u8 {
        self.channel
    }

    fn destination_address(&self) -> u16 {
        self.destination_address
    }

    fn source_address(&self) -> u16 {
        self.source_address
    }

    fn protocol_version(&self) -> u8 {
        TELEGRAM_PROTOCOL_VERSION
    }

    fn id_string(&self) -> String {
        format!("{}_{:02X}", self.header_id_string(), self.command)
    }
}

impl PartialOrd for Telegram {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Telegram {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_header(other)
            .then_with(|| self.command.cmp(&other.command))
            .then_with(|| self.frame_data.cmp(&other.frame_data))
    }
}

impl fmt::Display for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Telegram: id={}, frames={}",
            self.id_string(),
            self.frame_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Telegram {
        Telegram::new(
            0x7771,
            0x0020,
            0x25,
            &[0x01, 0x82, 0x03, 0x84, 0x05, 0x86, 0x07],
        )
    }

    #[test]
    fn test_frame_count_for_all_commands() {
        for command in 0..=255u8 {
            assert_eq!(frame_count_for_command(command), ((command >> 5) & 3) as usize);
            assert_eq!(
                live_length_for_command(command),
                8 + frame_count_for_command(command) * 9
            );
        }
    }

    #[test]
    fn test_to_live_buffer_layout() {
        let buf = sample().to_live_buffer();
        assert_eq!(buf.len(), 17);
        assert_eq!(buf[0], 0xAA);
        assert_eq!(&buf[1..5], &[0x71, 0x77, 0x20, 0x00]);
        assert_eq!(buf[5], 0x30);
        assert_eq!(buf[6], 0x25);
        // 0x71 + 0x77 + 0x20 + 0x30 + 0x25 = 0x15D
        assert_eq!(buf[7], 0x23);
        assert_eq!(&buf[8..16], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x2A]);
        assert!(buf.iter().skip(1).all(|&b| b & 0x80 == 0));
    }

    #[test]
    fn test_addresses_are_masked() {
        let telegram = Telegram::new(0xFFFF, 0x80A0, 0x00, &[]);
        let buf = telegram.to_live_buffer();
        assert_eq!(&buf[1..5], &[0x7F, 0x7F, 0x20, 0x00]);
    }

    #[test]
    fn test_round_trip_keeps_unused_frames_zero() {
        let telegram = Telegram::new(0x0010, 0x7E11, 0x41, &[0xAB; 21]);
        let decoded = Telegram::from_live_buffer(&telegram.to_live_buffer(), 0, 26).unwrap();
        assert_eq!(decoded.frame_count(), 2);
        assert_eq!(&decoded.frame_data()[..14], &[0xAB; 14]);
        assert_eq!(&decoded.frame_data()[14..], &[0u8; 7]);
    }

    #[test]
    fn test_copying_constructor_truncates_and_pads() {
        let telegram = Telegram::new(0, 0, 0x60, &[0x11; 30]);
        assert_eq!(telegram.frame_data(), &[0x11; 21]);

        let telegram = Telegram::new(0, 0, 0x60, &[0x11; 3]);
        assert_eq!(&telegram.frame_data()[..3], &[0x11; 3]);
        assert_eq!(&telegram.frame_data()[3..], &[0u8; 18]);
    }

    #[test]
    fn test_write_live_buffer_too_small_leaves_buffer_untouched() {
        let telegram = sample();
        let mut buf = [0x55u8; 20];
        match telegram.write_live_buffer(&mut buf, 4, 20) {
            Err(VbusError::BufferTooSmall { needed, available }) => {
                assert_eq!(needed, 17);
                assert_eq!(available, 16);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(buf, [0x55u8; 20]);

        assert_eq!(telegram.write_live_buffer(&mut buf, 3, 20).unwrap(), 17);
        assert_eq!(&buf[3..], &telegram.to_live_buffer()[..]);
        assert_eq!(&buf[..3], &[0x55; 3]);
    }

    #[test]
    fn test_from_live_buffer_at_offset() {
        let mut buf = vec![0x00, 0x01];
        buf.extend_from_slice(&sample().to_live_buffer());
        let len = buf.len();
        assert_eq!(Telegram::from_live_buffer(&buf, 2, len).unwrap(), sample());
    }

    #[test]
    fn test_from_live_buffer_truncated() {
        let buf = sample().to_live_buffer();
        match Telegram::from_live_buffer(&buf, 0, 16) {
            Err(VbusError::Truncated { needed, available }) => {
                assert_eq!(needed, 17);
                assert_eq!(available, 16);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            Telegram::from_live_buffer(&buf, 0, 5),
            Err(VbusError::Truncated { .. })
        ));
    }

    #[test]
    fn test_single_bit_flip_is_detected() {
        let telegram = Telegram::new(0x7771, 0x0020, 0x45, &[0x5A; 14]);
        let buf = telegram.to_live_buffer();
        for index in 0..buf.len() {
            for bit in 0..8 {
                let mut corrupt = buf.clone();
                corrupt[index] ^= 1 << bit;
                let result = Telegram::from_live_buffer(&corrupt, 0, corrupt.len());
                match result {
                    Err(err) => assert!(err.is_framing_error(), "{}", err),
                    Ok(decoded) => panic!(
                        "flip of bit {} in byte {} decoded to {}",
                        bit, index, decoded
                    ),
                }
            }
        }
    }

    #[test]
    fn test_id_and_ordering() {
        let a = Telegram::new(0x0010, 0x7E11, 0x05, &[]);
        let b = Telegram::new(0x0010, 0x7E11, 0x06, &[]);
        let c = Telegram::new(0x0010, 0x7E12, 0x01, &[]);
        assert_eq!(a.id_string(), "00_0010_7E11_30_05");
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.clone().with_channel(1).id_string(), "01_0010_7E11_30_05");
        assert!(c < a.with_channel(1));
    }
}
