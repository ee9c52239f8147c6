//! Stream accessor trait for transport layer

use async_trait::async_trait;
use std::time::Duration;
use vbus_core::{VbusError, VbusResult};

/// Stream accessor interface to access a physical stream to a VBus device
#[async_trait]
pub trait StreamAccessor: Send {
    /// Set the read/write timeout
    ///
    /// # Arguments
    ///
    /// * `timeout` - The timeout duration. None means infinite timeout.
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> VbusResult<()>;

    /// Read data from the stream
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 if EOF
    async fn read(&mut self, buf: &mut [u8]) -> VbusResult<usize>;

    /// Read exact number of bytes from the stream
    ///
    /// Returns error if unable to read the exact number of bytes
    async fn read_exact(&mut self, mut buf: &mut [u8]) -> VbusResult<()> {
        while !buf.is_empty() {
            let n = self.read(buf).await?;
            if n == 0 {
                return Err(VbusError::Connection(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "Failed to read exact number of bytes",
                )));
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }

    /// Write data to the stream
    ///
    /// # Returns
    ///
    /// Number of bytes written
    async fn write(&mut self, buf: &[u8]) -> VbusResult<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> VbusResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(VbusError::Connection(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Failed to write all data",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Flush any buffered data
    async fn flush(&mut self) -> VbusResult<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> VbusResult<()>;
}

/// Transport layer trait that extends StreamAccessor
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Open the physical layer connection
    async fn open(&mut self) -> VbusResult<()>;
}

pub(crate) fn not_connected(what: &str) -> VbusError {
    VbusError::Connection(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        format!("{} not connected", what),
    ))
}

pub(crate) fn already_open() -> VbusError {
    VbusError::Connection(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        "Connection has already been opened",
    ))
}
