//! Rust implementation of the RESOL VBus protocol
//!
//! VBus connects solar and heating controllers with adapters, data loggers
//! and displays. This library talks to such a bus as a client.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `vbus-core`: Error handling, header and telegram types, wire codec
//! - `vbus-transport`: Transport layer (Serial, TCP, in-memory streams)
//! - `vbus-session`: Live stream decoding, auto-reconnecting connection
//! - `vbus-configuration`: Per-controller configuration optimizers
//! - `vbus-client`: Connection builder, data sources, telegram exchange
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use vbus::client::{DataSource, LiveDataStream, LiveOptions};
//!
//! # async fn example() -> vbus::VbusResult<()> {
//! let connection = DataSource::serial("/dev/ttyACM0")
//!     .connect_live(LiveOptions::default())
//!     .await?;
//! let mut stream = LiveDataStream::new(connection);
//! while let Some(data) = stream.receive_live_data(Duration::from_secs(10)).await? {
//!     println!("{}", data);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use vbus_core::{Header, LiveData, Telegram, VbusError, VbusResult};

// Re-export codec primitives
pub mod codec {
    pub use vbus_core::checksum::*;
    pub use vbus_core::septet::*;
    pub use vbus_core::telegram::{frame_count_for_command, live_length_for_command};
}

// Re-export transport layer
pub mod transport {
    pub use vbus_transport::*;
}

// Re-export session layer
pub mod session {
    pub use vbus_session::*;
}

// Re-export configuration optimizers
pub mod configuration {
    pub use vbus_configuration::*;
}

// Re-export client API
pub mod client {
    pub use vbus_client::*;
}
