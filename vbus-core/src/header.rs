//! Common header fields shared by all VBus frame kinds

use std::cmp::Ordering;

/// Sync byte starting every frame on the wire
pub const SYNC_BYTE: u8 = 0xAA;

/// Mask applied to addresses on the wire (bit 7 of each byte is reserved)
pub const ADDRESS_MASK: u16 = 0x7F7F;

/// Default bus address used by this client
pub const DEFAULT_SELF_ADDRESS: u16 = 0x0020;

/// Header fields and identity of a VBus frame
///
/// Implementors are immutable value objects.
pub trait Header {
    /// The VBus channel the frame was seen on
    fn channel(&self) -> u8;

    /// Destination bus address
    fn destination_address(&self) -> u16;

    /// Source bus address
    fn source_address(&self) -> u16;

    /// Protocol version, identifies the payload shape
    fn protocol_version(&self) -> u8;

    /// Identity key common to all frame kinds
    fn header_id_string(&self) -> String {
        format!(
            "{:02X}_{:04X}_{:04X}_{:02X}",
            self.channel(),
            self.destination_address(),
            self.source_address(),
            self.protocol_version()
        )
    }

    /// Identity key, extended by frame kinds that carry more fields
    fn id_string(&self) -> String {
        self.header_id_string()
    }

    /// Compare the common header fields
    fn compare_header(&self, other: &dyn Header) -> Ordering {
        self.channel()
            .cmp(&other.channel())
            .then_with(|| self.destination_address().cmp(&other.destination_address()))
            .then_with(|| self.source_address().cmp(&other.source_address()))
            .then_with(|| self.protocol_version().cmp(&other.protocol_version()))
    }
}
