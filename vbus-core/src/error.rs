use thiserror::Error;

/// Main error type for VBus operations
#[derive(Error, Debug)]
pub enum VbusError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Not connected")]
    NotConnected,

    #[error("Connection was disconnected")]
    Disconnected,

    #[error("Invalid state for {operation}: {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Checksum mismatch at offset {offset}: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch {
        offset: usize,
        expected: u8,
        actual: u8,
    },

    #[error("Truncated frame: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Frame invalid: {0}")]
    FrameInvalid(String),

    #[error("Unsupported protocol version: 0x{0:02X}")]
    UnsupportedProtocolVersion(u8),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl VbusError {
    /// Whether this error was raised while encoding or decoding a frame
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            VbusError::ChecksumMismatch { .. }
                | VbusError::Truncated { .. }
                | VbusError::BufferTooSmall { .. }
                | VbusError::FrameInvalid(_)
                | VbusError::UnsupportedProtocolVersion(_)
        )
    }
}

/// Result type alias for VBus operations
pub type VbusResult<T> = Result<T, VbusError>;
