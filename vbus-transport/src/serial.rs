//! Serial port transport implementation

use crate::io::IoTransport;
use crate::stream::{StreamAccessor, TransportLayer, already_open};
use async_trait::async_trait;
use std::time::Duration;
use tokio_serial::SerialStream;
use vbus_core::{VbusError, VbusResult};

/// Baud rate of the VBus serial interface
pub const VBUS_BAUD_RATE: u32 = 9600;

/// Serial port transport layer settings
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: tokio_serial::DataBits,
    pub stop_bits: tokio_serial::StopBits,
    pub parity: tokio_serial::Parity,
    pub flow_control: tokio_serial::FlowControl,
    pub timeout: Option<Duration>,
}

impl SerialSettings {
    /// Create new serial settings with VBus line parameters (8N1)
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        Self {
            port_name,
            baud_rate,
            data_bits: tokio_serial::DataBits::Eight,
            stop_bits: tokio_serial::StopBits::One,
            parity: tokio_serial::Parity::None,
            flow_control: tokio_serial::FlowControl::None,
            timeout: None,
        }
    }

    /// Create serial settings with timeout
    pub fn with_timeout(port_name: String, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::new(port_name, baud_rate)
        }
    }
}

/// Serial port transport layer implementation
#[derive(Debug)]
pub struct SerialTransport {
    io: IoTransport<SerialStream>,
    settings: SerialSettings,
}

impl SerialTransport {
    /// Create a new serial transport layer
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            io: IoTransport::disconnected("Serial stream", settings.timeout),
            settings,
        }
    }

    /// Create serial transport with port name at the VBus baud rate
    pub fn new_simple(port_name: String) -> Self {
        Self::new(SerialSettings::new(port_name, VBUS_BAUD_RATE))
    }

    /// Get the settings
    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }
}

#[async_trait]
impl TransportLayer for SerialTransport {
    async fn open(&mut self) -> VbusResult<()> {
        if !self.io.is_closed() {
            return Err(already_open());
        }

        let builder = tokio_serial::new(&self.settings.port_name, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .stop_bits(self.settings.stop_bits)
            .parity(self.settings.parity)
            .flow_control(self.settings.flow_control);

        let stream = SerialStream::open(&builder).map_err(|e| {
            VbusError::Connection(std::io::Error::other(format!(
                "Failed to open serial port {}: {}",
                self.settings.port_name, e
            )))
        })?;

        log::debug!("Opened serial port {}", self.settings.port_name);
        self.io = IoTransport::named(stream, "Serial stream", self.settings.timeout);
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for SerialTransport {
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
