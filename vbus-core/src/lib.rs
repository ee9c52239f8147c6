//! Core types and utilities for the RESOL VBus protocol
//!
//! This crate provides the error type, the common header capability, the
//! telegram record and its bit-exact live wire codec.

pub mod checksum;
pub mod error;
pub mod header;
pub mod live_data;
pub mod septet;
pub mod telegram;

pub use checksum::{ChecksumCalc, calc_checksum};
pub use error::{VbusError, VbusResult};
pub use header::{ADDRESS_MASK, DEFAULT_SELF_ADDRESS, Header, SYNC_BYTE};
pub use live_data::LiveData;
pub use septet::{decode_septet, encode_septet};
pub use telegram::{FRAME_DATA_LENGTH, TELEGRAM_PROTOCOL_VERSION, Telegram, frame_count_for_command};
