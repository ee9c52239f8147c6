//! Transport over any already-connected async byte stream

use crate::stream::{StreamAccessor, not_connected};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use vbus_core::{VbusError, VbusResult};

/// Stream accessor around an `AsyncRead + AsyncWrite` stream
///
/// Serial and TCP transports use this once their stream is opened. It can
/// also wrap in-memory streams directly.
pub struct IoTransport<S> {
    stream: Option<S>,
    name: &'static str,
    timeout: Option<Duration>,
    closed: bool,
}

impl<S> IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream
    pub fn new(stream: S, timeout: Option<Duration>) -> Self {
        Self::named(stream, "I/O stream", timeout)
    }

    pub(crate) fn named(stream: S, name: &'static str, timeout: Option<Duration>) -> Self {
        Self {
            stream: Some(stream),
            name,
            timeout,
            closed: false,
        }
    }

    pub(crate) fn disconnected(name: &'static str, timeout: Option<Duration>) -> Self {
        Self {
            stream: None,
            name,
            timeout,
            closed: true,
        }
    }

    /// Get a mutable reference to the underlying stream
    pub fn get_mut(&mut self) -> Option<&mut S> {
        self.stream.as_mut()
    }
}

impl<S> fmt::Debug for IoTransport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoTransport")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("closed", &self.closed)
            .finish()
    }
}

#[async_trait]
impl<S> StreamAccessor for IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> VbusResult<()> {
        self.timeout = timeout;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> VbusResult<usize> {
        let name = self.name;
        let timeout = self.timeout;
        let stream = self.stream.as_mut().ok_or_else(|| not_connected(name))?;

        let result = if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| VbusError::Timeout)?
                .map_err(VbusError::Connection)
        } else {
            stream.read(buf).await.map_err(VbusError::Connection)
        };

        match result {
            Ok(0) => {
                self.closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> VbusResult<usize> {
        let name = self.name;
        let timeout = self.timeout;
        let stream = self.stream.as_mut().ok_or_else(|| not_connected(name))?;

        if let Some(timeout) = timeout {
            tokio::time::timeout(timeout, stream.write(buf))
                .await
                .map_err(|_| VbusError::Timeout)?
                .map_err(VbusError::Connection)
        } else {
            stream.write(buf).await.map_err(VbusError::Connection)
        }
    }

    async fn flush(&mut self) -> VbusResult<()> {
        let name = self.name;
        let stream = self.stream.as_mut().ok_or_else(|| not_connected(name))?;
        stream.flush().await.map_err(VbusError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> VbusResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_and_write_through_mock() {
        let mock = Builder::new()
            .read(&[0xAA, 0x10])
            .write(&[0x01, 0x02, 0x03])
            .build();
        let mut transport = IoTransport::new(mock, None);

        let mut buf = [0u8; 8];
        let n = transport.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0x10]);

        transport.write_all(&[0x01, 0x02, 0x03]).await.unwrap();
        assert!(!transport.is_closed());
    }

    #[tokio::test]
    async fn test_eof_marks_closed() {
        let mock = Builder::new().build();
        let mut transport = IoTransport::new(mock, Some(Duration::from_secs(1)));

        let mut buf = [0u8; 8];
        assert_eq!(transport.read(&mut buf).await.unwrap(), 0);
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn test_read_error_marks_closed() {
        let mock = Builder::new()
            .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let mut transport = IoTransport::new(mock, None);

        let mut buf = [0u8; 8];
        assert!(matches!(
            transport.read(&mut buf).await,
            Err(VbusError::Connection(_))
        ));
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn test_closed_transport_reports_not_connected() {
        let mut transport = IoTransport::new(Builder::new().build(), None);
        transport.close().await.unwrap();
        assert!(transport.is_closed());

        let mut buf = [0u8; 1];
        match transport.read(&mut buf).await {
            Err(VbusError::Connection(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotConnected)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
