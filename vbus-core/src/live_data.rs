//! Tagged variant over all frame kinds understood by this crate

use crate::error::{VbusError, VbusResult};
use crate::header::{Header, SYNC_BYTE};
use crate::telegram::{TELEGRAM_PROTOCOL_VERSION, Telegram, live_length_for_command};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A decoded VBus frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiveData {
    Telegram(Telegram),
}

impl LiveData {
    /// Decode whichever frame kind starts at `buf[start]`
    pub fn from_live_buffer(buf: &[u8], start: usize, end: usize) -> VbusResult<Self> {
        match protocol_version_at(buf, start, end)? {
            TELEGRAM_PROTOCOL_VERSION => {
                Telegram::from_live_buffer(buf, start, end).map(LiveData::Telegram)
            }
            version => Err(VbusError::UnsupportedProtocolVersion(version)),
        }
    }

    /// Encode into a newly allocated buffer
    pub fn to_live_buffer(&self) -> Vec<u8> {
        match self {
            LiveData::Telegram(telegram) => telegram.to_live_buffer(),
        }
    }

    /// Wire length of the frame starting at `buf[start]`, if it can be told yet
    ///
    /// Returns `Ok(None)` while the bytes that decide the length have not
    /// arrived.
    pub fn live_length_at(buf: &[u8], start: usize, end: usize) -> VbusResult<Option<usize>> {
        let end = end.min(buf.len());
        if end < start + 7 {
            return Ok(None);
        }
        match protocol_version_at(buf, start, end)? {
            TELEGRAM_PROTOCOL_VERSION => Ok(Some(live_length_for_command(buf[start + 6]))),
            version => Err(VbusError::UnsupportedProtocolVersion(version)),
        }
    }

    /// Get the telegram, if this is one
    pub fn as_telegram(&self) -> Option<&Telegram> {
        match self {
            LiveData::Telegram(telegram) => Some(telegram),
        }
    }

    fn header(&self) -> &dyn Header {
        match self {
            LiveData::Telegram(telegram) => telegram,
        }
    }
}

fn protocol_version_at(buf: &[u8], start: usize, end: usize) -> VbusResult<u8> {
    let available = end.min(buf.len()).saturating_sub(start);
    if available < 6 {
        return Err(VbusError::Truncated {
            needed: 6,
            available,
        });
    }
    if buf[start] != SYNC_BYTE {
        return Err(VbusError::FrameInvalid(format!(
            "Expected sync byte 0xAA, but received: 0x{:02X}",
            buf[start]
        )));
    }
    Ok(buf[start + 5])
}

impl From<Telegram> for LiveData {
    fn from(telegram: Telegram) -> Self {
        LiveData::Telegram(telegram)
    }
}

impl Header for LiveData {
    fn channel(&self) -> u8 {
        self.header().channel()
    }

    fn destination_address(&self) -> u16 {
        self.header().destination_address()
    }

    fn source_address(&self) -> u16 {
        self.header().source_address()
    }

    fn protocol_version(&self) -> u8 {
        self.header().protocol_version()
    }

    fn id_string(&self) -> String {
        self.header().id_string()
    }
}

impl PartialOrd for LiveData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LiveData {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (LiveData::Telegram(a), LiveData::Telegram(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for LiveData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveData::Telegram(telegram) => fmt::Display::fmt(telegram, f),
        }
    }
}
