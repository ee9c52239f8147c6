//! VBus checksum calculation
//!
//! The checksum byte of a range makes the sum of the range and the checksum
//! zero modulo 256 when restricted to seven bits:
//! `checksum = (0x100 - (sum mod 0x100)) & 0x7F`.

use crate::error::{VbusError, VbusResult};

/// Running checksum calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumCalc {
    sum: u8,
}

impl ChecksumCalc {
    /// Create a new checksum calculator
    pub fn new() -> Self {
        Self { sum: 0 }
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.sum = 0;
    }

    /// Update with a single byte
    pub fn update(&mut self, data: u8) {
        self.sum = self.sum.wrapping_add(data);
    }

    /// Update with multiple bytes
    pub fn update_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Get the checksum byte for everything seen so far
    pub fn value(&self) -> u8 {
        0u8.wrapping_sub(self.sum) & 0x7F
    }

    /// Validate a received checksum byte located at `offset`
    pub fn validate(&self, actual: u8, offset: usize) -> VbusResult<()> {
        let expected = self.value();
        if expected != actual {
            Err(VbusError::ChecksumMismatch {
                offset,
                expected,
                actual,
            })
        } else {
            Ok(())
        }
    }
}

/// Calculate the checksum byte for a range of bytes
pub fn calc_checksum(data: &[u8]) -> u8 {
    let mut calc = ChecksumCalc::new();
    calc.update_bytes(data);
    calc.value()
}

/// Write the checksum of `buf[start..end]` into `buf[end]`
pub fn calc_and_set_checksum(buf: &mut [u8], start: usize, end: usize) {
    buf[end] = calc_checksum(&buf[start..end]);
}

/// Verify that `buf[end]` is the checksum of `buf[start..end]`
pub fn verify_checksum(buf: &[u8], start: usize, end: usize) -> VbusResult<()> {
    let mut calc = ChecksumCalc::new();
    calc.update_bytes(&buf[start..end]);
    calc.validate(buf[end], end)
}

/// Ensure every byte in the range has bit 7 clear
///
/// The checksum only covers seven bits per byte, so a stray high bit would
/// otherwise go unnoticed.
pub fn ensure_septet_clean(buf: &[u8], start: usize, end: usize) -> VbusResult<()> {
    match buf[start..end].iter().position(|&b| b & 0x80 != 0) {
        Some(index) => Err(VbusError::FrameInvalid(format!(
            "Byte 0x{:02X} at offset {} has MSB set",
            buf[start + index],
            start + index
        ))),
        None => Ok(()),
    }
}
