//! Transport layer module for the RESOL VBus protocol
//!
//! This crate provides transport layer implementations for Serial and TCP
//! communication, plus the factory abstraction connections use to (re)open
//! their transport.

pub mod factory;
pub mod io;
pub mod serial;
pub mod stream;
pub mod tcp;

pub use factory::{ConnectionParams, SerialTransportFactory, TcpTransportFactory, TransportFactory};
pub use io::IoTransport;
pub use serial::{SerialSettings, SerialTransport, VBUS_BAUD_RATE};
pub use stream::{StreamAccessor, TransportLayer};
pub use tcp::{TcpSettings, TcpTransport, VBUS_TCP_PORT};
pub use vbus_core::{VbusError, VbusResult};
