//! Transport factories
//!
//! A connection does not know how to reach a device; it asks a
//! [`TransportFactory`] for an opened stream every time it (re)connects.

use crate::serial::{SerialSettings, SerialTransport, VBUS_BAUD_RATE};
use crate::stream::{StreamAccessor, TransportLayer};
use crate::tcp::{TcpSettings, TcpTransport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vbus_core::{DEFAULT_SELF_ADDRESS, VbusResult};

/// Parameters identifying one VBus endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Serial port path or `host:port`
    pub path: String,
    /// VBus channel, relevant for multi-channel adapters
    pub channel: u8,
    /// Bus address of this client
    pub self_address: u16,
    /// Treat the link as interrupted after this long without receiving data
    ///
    /// Controllers broadcast continuously, so silence usually means a dead
    /// link that the operating system has not noticed yet.
    pub idle_timeout_ms: Option<u64>,
}

impl ConnectionParams {
    /// Create parameters for the given path with default channel and address
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// Idle timeout as a duration, `None` if disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            path: String::new(),
            channel: 0,
            self_address: DEFAULT_SELF_ADDRESS,
            idle_timeout_ms: None,
        }
    }
}

/// Opens transports on behalf of a connection
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Open a new stream to the endpoint described by `params`
    async fn open(&self, params: &ConnectionParams) -> VbusResult<Box<dyn StreamAccessor>>;
}

/// Opens serial ports
#[derive(Debug, Clone)]
pub struct SerialTransportFactory {
    pub baud_rate: u32,
}

impl Default for SerialTransportFactory {
    fn default() -> Self {
        Self {
            baud_rate: VBUS_BAUD_RATE,
        }
    }
}

#[async_trait]
impl TransportFactory for SerialTransportFactory {
    async fn open(&self, params: &ConnectionParams) -> VbusResult<Box<dyn StreamAccessor>> {
        let mut transport =
            SerialTransport::new(SerialSettings::new(params.path.clone(), self.baud_rate));
        transport.open().await?;
        Ok(Box::new(transport))
    }
}

/// Opens TCP connections, optionally performing the LAN adapter handshake
#[derive(Debug, Clone, Default)]
pub struct TcpTransportFactory {
    pub connect_timeout: Option<Duration>,
    pub via_tag: Option<String>,
    pub password: Option<String>,
}

#[async_trait]
impl TransportFactory for TcpTransportFactory {
    async fn open(&self, params: &ConnectionParams) -> VbusResult<Box<dyn StreamAccessor>> {
        let mut settings = TcpSettings::new(&params.path);
        if let Some(connect_timeout) = self.connect_timeout {
            settings.connect_timeout = connect_timeout;
        }
        settings.via_tag = self.via_tag.clone();
        settings.password = self.password.clone();

        let mut transport = TcpTransport::new(settings);
        transport.open().await?;
        Ok(Box::new(transport))
    }
}
