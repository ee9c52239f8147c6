//! TCP transport implementation
//!
//! VBus LAN adapters (DL2, DL3, KM2, VBus/LAN) greet with `+HELLO` and
//! expect a `PASS` / `DATA` command exchange before the raw VBus stream
//! starts. The handshake is performed when a password is configured.

use crate::io::IoTransport;
use crate::stream::{StreamAccessor, TransportLayer, already_open};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use vbus_core::{VbusError, VbusResult};

/// Default port of VBus-over-TCP services
pub const VBUS_TCP_PORT: u16 = 7053;

const MAX_REPLY_LENGTH: usize = 256;

/// TCP transport layer settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    /// `host:port`, the port defaults to 7053 when missing
    pub address: String,
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub via_tag: Option<String>,
    pub password: Option<String>,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(address: &str) -> Self {
        let address = if address.contains(':') {
            address.to_string()
        } else {
            format!("{}:{}", address, VBUS_TCP_PORT)
        };
        Self {
            address,
            timeout: None,
            connect_timeout: Duration::from_secs(30),
            via_tag: None,
            password: None,
        }
    }

    /// Create TCP settings with timeout
    pub fn with_timeout(address: &str, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::new(address)
        }
    }

    /// Enable the LAN adapter handshake with the given password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }
}

/// TCP transport layer implementation
#[derive(Debug)]
pub struct TcpTransport {
    io: IoTransport<TcpStream>,
    settings: TcpSettings,
}

impl TcpTransport {
    /// Create a new TCP transport layer
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            io: IoTransport::disconnected("TCP stream", settings.timeout),
            settings,
        }
    }

    /// Create TCP transport from address string
    pub fn from_address(address: &str) -> Self {
        Self::new(TcpSettings::new(address))
    }

    /// Get the settings
    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }
}

#[async_trait]
impl TransportLayer for TcpTransport {
    async fn open(&mut self) -> VbusResult<()> {
        if !self.io.is_closed() {
            return Err(already_open());
        }

        let mut stream = tokio::time::timeout(
            self.settings.connect_timeout,
            TcpStream::connect(self.settings.address.as_str()),
        )
        .await
        .map_err(|_| VbusError::Timeout)??;

        if let Some(password) = &self.settings.password {
            tokio::time::timeout(
                self.settings.connect_timeout,
                handshake(&mut stream, self.settings.via_tag.as_deref(), password),
            )
            .await
            .map_err(|_| VbusError::Timeout)??;
        }

        log::debug!("Connected to {}", self.settings.address);
        self.io = IoTransport::named(stream, "TCP stream", self.settings.timeout);
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for TcpTransport {
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> VbusResult<()> {
        self.settings.timeout = timeout;
        self.io.set_timeout(timeout).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> VbusResult<usize> {
        self.io.read(buf).await
    }

    async fn write(&mut self, buf: &[u8]) -> VbusResult<usize> {
        self.io.write(buf).await
    }

    async fn flush(&mut self) -> VbusResult<()> {
        self.io.flush().await
    }

    fn is_closed(&self) -> bool {
        self.io.is_closed()
    }

    async fn close(&mut self) -> VbusResult<()> {
        self.io.close().await
    }
}

/// Perform the LAN adapter command handshake
pub async fn handshake<S>(stream: &mut S, via_tag: Option<&str>, password: &str) -> VbusResult<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    expect_reply(stream, "+HELLO").await?;

    if let Some(via_tag) = via_tag {
        send_command(stream, &format!("CONNECT {}", via_tag)).await?;
        expect_reply(stream, "+OK").await?;
    }

    send_command(stream, &format!("PASS {}", password)).await?;
    expect_reply(stream, "+OK").await?;

    send_command(stream, "DATA").await?;
    expect_reply(stream, "+OK").await
}

async fn send_command<S>(stream: &mut S, command: &str) -> VbusResult<()>
where
    S: tokio::io::AsyncWrite + Unpin,
{
    stream.write_all(command.as_bytes()).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await?;
    Ok(())
}

async fn expect_reply<S>(stream: &mut S, expected: &str) -> VbusResult<()>
where
    S: tokio::io::AsyncRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        let byte = stream.read_u8().await?;
        if byte == b'\n' {
            break;
        }
        if line.len() >= MAX_REPLY_LENGTH {
            return Err(VbusError::InvalidData("Handshake reply too long".to_string()));
        }
        line.push(byte);
    }

    let line = String::from_utf8_lossy(&line);
    let line = line.trim_end();
    if line.starts_with(expected) {
        Ok(())
    } else {
        Err(VbusError::InvalidData(format!(
            "Unexpected handshake reply {:?}, expected {}",
            line, expected
        )))
    }
}
