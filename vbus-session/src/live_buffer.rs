//! Resynchronizing decoder for the live VBus byte stream
//!
//! Received chunks are appended to the buffer and every complete frame is
//! extracted. Corrupt input never stops decoding:
//! - bytes before a sync byte are discarded
//! - a frame cut short by a byte with MSB set is dropped, scanning resumes
//!   at that byte
//! - checksum failures and unknown protocol versions skip the sync byte

use bytes::{Buf, BytesMut};
use vbus_core::{LiveData, SYNC_BYTE};

/// Default upper bound for buffered, undecoded bytes
pub const DEFAULT_MAX_BUFFERED: usize = 4096;

/// Buffer accumulating live bytes and yielding decoded frames
#[derive(Debug)]
pub struct LiveDataBuffer {
    buffer: BytesMut,
    channel: u8,
    max_buffered: usize,
    rejected: u64,
}

impl LiveDataBuffer {
    /// Create a buffer for channel 0
    pub fn new() -> Self {
        Self::with_channel(0)
    }

    /// Create a buffer whose telegrams are tagged with `channel`
    pub fn with_channel(channel: u8) -> Self {
        Self {
            buffer: BytesMut::with_capacity(1024),
            channel,
            max_buffered: DEFAULT_MAX_BUFFERED,
            rejected: 0,
        }
    }

    /// Number of frames dropped so far
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Number of buffered, undecoded bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append a received chunk and return all frames completed by it
    pub fn push(&mut self, data: &[u8]) -> Vec<LiveData> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one() {
            frames.push(frame);
        }

        if self.buffer.len() > self.max_buffered {
            let excess = self.buffer.len() - self.max_buffered;
            log::debug!("Discarding {} buffered bytes", excess);
            self.buffer.advance(excess);
        }

        frames
    }

    /// Extract the next frame, `None` when more input is needed
    pub fn try_extract_one(&mut self) -> Option<LiveData> {
        loop {
            match self.buffer.iter().position(|&b| b == SYNC_BYTE) {
                Some(index) => self.buffer.advance(index),
                None => {
                    self.buffer.clear();
                    return None;
                }
            }

            // A byte with MSB set after the sync byte starts a new frame
            let available = self.buffer.len();
            let limit = match self.buffer[1..].iter().position(|&b| b & 0x80 != 0) {
                Some(index) => index + 1,
                None => available,
            };

            let length = match LiveData::live_length_at(&self.buffer, 0, limit) {
                Ok(Some(length)) => length,
                Ok(None) if limit == available => return None,
                Ok(None) => {
                    self.reject("frame interrupted by MSB byte");
                    self.buffer.advance(limit);
                    continue;
                }
                Err(err) => {
                    self.reject(&err.to_string());
                    self.buffer.advance(1);
                    continue;
                }
            };

            if length > limit {
                if limit == available {
                    return None;
                }
                self.reject("frame interrupted by MSB byte");
                self.buffer.advance(limit);
                continue;
            }

            let result = LiveData::from_live_buffer(&self.buffer, 0, length);
            match result {
                Ok(LiveData::Telegram(telegram)) => {
                    self.buffer.advance(length);
                    return Some(LiveData::Telegram(telegram.with_channel(self.channel)));
                }
                Err(err) => {
                    self.reject(&err.to_string());
                    self.buffer.advance(1);
                }
            }
        }
    }

    fn reject(&mut self, reason: &str) {
        self.rejected += 1;
        log::debug!("Rejected live frame: {}", reason);
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for LiveDataBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbus_core::{Header, Telegram, frame_count_for_command};

    fn telegram(command: u8, fill: u8) -> Telegram {
        let frame_data = vec![fill; frame_count_for_command(command) * 7];
        Telegram::new(0x0020, 0x7E11, command, &frame_data)
    }

    #[test]
    fn test_extracts_frames_across_chunks() {
        let t1 = telegram(0x25, 0x81);
        let t2 = telegram(0x05, 0x00);
        let mut bytes = t1.to_live_buffer();
        bytes.extend_from_slice(&t2.to_live_buffer());

        let mut buffer = LiveDataBuffer::new();
        let mut frames = buffer.push(&bytes[..10]);
        assert!(frames.is_empty());
        frames.extend(buffer.push(&bytes[10..]));

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_telegram(), Some(&t1));
        assert_eq!(frames[1].as_telegram(), Some(&t2));
        assert!(buffer.is_empty());
        assert_eq!(buffer.rejected_count(), 0);
    }

    #[test]
    fn test_skips_garbage_before_sync() {
        let t1 = telegram(0x45, 0x12);
        let mut bytes = vec![0x01, 0x02, 0x7F];
        bytes.extend_from_slice(&t1.to_live_buffer());

        let frames = LiveDataBuffer::new().push(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_telegram(), Some(&t1));
    }

    #[test]
    fn test_resyncs_after_truncated_frame() {
        let t1 = telegram(0x65, 0x33);
        let t2 = telegram(0x25, 0x44);
        let mut bytes = t1.to_live_buffer();
        bytes.truncate(20);
        bytes.extend_from_slice(&t2.to_live_buffer());

        let mut buffer = LiveDataBuffer::new();
        let frames = buffer.push(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_telegram(), Some(&t2));
        assert_eq!(buffer.rejected_count(), 1);
    }

    #[test]
    fn test_resyncs_after_checksum_error() {
        let t1 = telegram(0x25, 0x10);
        let t2 = telegram(0x25, 0x20);
        let mut bytes = t1.to_live_buffer();
        bytes[9] ^= 0x01;
        bytes.extend_from_slice(&t2.to_live_buffer());

        let mut buffer = LiveDataBuffer::new();
        let frames = buffer.push(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_telegram(), Some(&t2));
        assert_eq!(buffer.rejected_count(), 1);
    }

    #[test]
    fn test_skips_unsupported_protocol_version() {
        // protocol version 1.0 packet header followed by a telegram
        let mut bytes = vec![0xAA, 0x10, 0x00, 0x11, 0x7E, 0x10, 0x00, 0x01, 0x00, 0x4F];
        let t1 = telegram(0x05, 0x00);
        bytes.extend_from_slice(&t1.to_live_buffer());

        let mut buffer = LiveDataBuffer::new();
        let frames = buffer.push(&bytes);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_telegram(), Some(&t1));
        assert_eq!(buffer.rejected_count(), 1);
    }

    #[test]
    fn test_tags_channel() {
        let bytes = telegram(0x05, 0x00).to_live_buffer();
        let frames = LiveDataBuffer::with_channel(2).push(&bytes);
        assert_eq!(frames[0].channel(), 2);
        assert_eq!(frames[0].id_string(), "02_0020_7E11_30_05");
    }
}
