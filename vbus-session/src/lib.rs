//! Session layer for the RESOL VBus protocol
//!
//! This crate turns a raw transport into a stream of decoded frames and
//! keeps that transport alive:
//!
//! - [`LiveDataBuffer`] resynchronizes on the live byte stream and yields
//!   [`vbus_core::LiveData`] frames
//! - [`Connection`] supervises a transport opened through a
//!   [`vbus_transport::TransportFactory`], publishing every state change
//!   and reconnecting automatically after interruptions

pub mod connection;
pub mod live_buffer;
pub mod reconnect;
pub mod state;
pub mod statistics;

pub use connection::{Connection, DATA_CHANNEL_CAPACITY};
pub use live_buffer::{DEFAULT_MAX_BUFFERED, LiveDataBuffer};
pub use reconnect::ReconnectPolicy;
pub use state::ConnectionState;
pub use statistics::ConnectionStatistics;
pub use vbus_core::{VbusError, VbusResult};
