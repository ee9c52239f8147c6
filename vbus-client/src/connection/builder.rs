//! Connection builder for VBus clients
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use vbus_client::ConnectionBuilder;
//!
//! # async fn example() -> vbus_core::VbusResult<()> {
//! // Serial connection through a VBus/USB adapter
//! let connection = ConnectionBuilder::new().serial("/dev/ttyACM0").build()?;
//! connection.connect().await?;
//!
//! // TCP connection to a LAN adapter
//! let connection = ConnectionBuilder::new()
//!     .tcp("192.168.1.10")
//!     .password("vbus")
//!     .build()?;
//! connection.connect().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use vbus_core::{DEFAULT_SELF_ADDRESS, VbusError, VbusResult};
use vbus_session::{Connection, ReconnectPolicy};
use vbus_transport::{
    ConnectionParams, SerialTransportFactory, TcpTransportFactory, TransportFactory,
    VBUS_BAUD_RATE,
};

/// Builder for [`Connection`]s
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    transport_type: TransportType,
    channel: u8,
    self_address: u16,
    reconnect_policy: ReconnectPolicy,
    idle_timeout: Option<Duration>,
}

#[derive(Clone)]
enum TransportType {
    Serial {
        path: String,
        baud_rate: u32,
    },
    Tcp {
        address: String,
        via_tag: Option<String>,
        password: Option<String>,
    },
    Custom {
        path: String,
        factory: Arc<dyn TransportFactory>,
    },
    None,
}

impl fmt::Debug for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportType::Serial { path, baud_rate } => f
                .debug_struct("Serial")
                .field("path", path)
                .field("baud_rate", baud_rate)
                .finish(),
            TransportType::Tcp { address, via_tag, .. } => f
                .debug_struct("Tcp")
                .field("address", address)
                .field("via_tag", via_tag)
                .finish_non_exhaustive(),
            TransportType::Custom { path, .. } => f
                .debug_struct("Custom")
                .field("path", path)
                .finish_non_exhaustive(),
            TransportType::None => f.write_str("None"),
        }
    }
}

impl ConnectionBuilder {
    /// Create a builder without transport, on channel 0 with the default
    /// self address and reconnect policy
    pub fn new() -> Self {
        Self {
            transport_type: TransportType::None,
            channel: 0,
            self_address: DEFAULT_SELF_ADDRESS,
            reconnect_policy: ReconnectPolicy::default(),
            idle_timeout: None,
        }
    }

    /// Use the serial port at `path` at 9600 baud
    pub fn serial(self, path: &str) -> Self {
        self.serial_with_baud_rate(path, VBUS_BAUD_RATE)
    }

    pub fn serial_with_baud_rate(mut self, path: &str, baud_rate: u32) -> Self {
        self.transport_type = TransportType::Serial {
            path: path.to_string(),
            baud_rate,
        };
        self
    }

    /// Use a TCP connection to `address` (`host` or `host:port`)
    pub fn tcp(mut self, address: &str) -> Self {
        self.transport_type = TransportType::Tcp {
            address: address.to_string(),
            via_tag: None,
            password: None,
        };
        self
    }

    /// Set the LAN adapter password, performing the login handshake
    ///
    /// Only applies to TCP transports.
    pub fn password(mut self, value: &str) -> Self {
        if let TransportType::Tcp { password, .. } = &mut self.transport_type {
            *password = Some(value.to_string());
        }
        self
    }

    /// Set the via tag used to reach adapters behind the VBus.net relay
    ///
    /// Only applies to TCP transports.
    pub fn via_tag(mut self, value: &str) -> Self {
        if let TransportType::Tcp { via_tag, .. } = &mut self.transport_type {
            *via_tag = Some(value.to_string());
        }
        self
    }

    /// Open transports through `factory`, passing `path` to it
    pub fn transport_factory(mut self, path: &str, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport_type = TransportType::Custom {
            path: path.to_string(),
            factory,
        };
        self
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn self_address(mut self, address: u16) -> Self {
        self.self_address = address;
        self
    }

    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    /// Reconnect when nothing was received for `timeout`
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Build a disconnected [`Connection`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if no transport was configured.
    pub fn build(self) -> VbusResult<Connection> {
        let (path, factory): (String, Arc<dyn TransportFactory>) = match self.transport_type {
            TransportType::Serial { path, baud_rate } => {
                (path, Arc::new(SerialTransportFactory { baud_rate }))
            }
            TransportType::Tcp {
                address,
                via_tag,
                password,
            } => (
                address,
                Arc::new(TcpTransportFactory {
                    connect_timeout: None,
                    via_tag,
                    password,
                }),
            ),
            TransportType::Custom { path, factory } => (path, factory),
            TransportType::None => {
                return Err(VbusError::InvalidData(
                    "Transport type must be configured (Serial, TCP or custom factory)"
                        .to_string(),
                ));
            }
        };

        let params = ConnectionParams {
            path,
            channel: self.channel,
            self_address: self.self_address,
            idle_timeout_ms: self
                .idle_timeout
                .map(|timeout| u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
        };
        Ok(Connection::new(factory, params, self.reconnect_policy))
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
