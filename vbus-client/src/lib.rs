//! RESOL VBus client
//!
//! This crate provides the client-side entry points: building connections
//! to serial or TCP VBus adapters and exchanging telegrams over them.

pub mod connection;
pub mod data_source;
pub mod live_data_stream;

pub use connection::ConnectionBuilder;
pub use data_source::{DataSource, LiveOptions};
pub use live_data_stream::LiveDataStream;
pub use vbus_session::{Connection, ConnectionState, ReconnectPolicy};
