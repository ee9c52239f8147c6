//! Connection setup

pub mod builder;

pub use builder::ConnectionBuilder;
