//! Connection state machine states

use serde::{Deserialize, Serialize};
use std::fmt;
use vbus_core::{VbusError, VbusResult};

/// Connection state
///
/// # State Transitions
/// ```text
/// Disconnected -> Connecting     (connect())
/// Connecting   -> Connected      (transport opened)
/// Connecting   -> Disconnected   (open failed)
/// Connected    -> Interrupted    (transport error or EOF)
/// Interrupted  -> Reconnecting   (immediately)
/// Reconnecting -> Connected      (transport reopened)
/// Reconnecting -> Reconnecting   (reopen failed, next attempt)
/// Reconnecting -> Disconnected   (attempts exhausted)
/// any          -> Disconnected   (disconnect())
/// ```
///
/// # Why Separate Interrupted and Reconnecting?
/// Listeners can tell a lost link (`Interrupted`, published once per
/// failure) from each reopen attempt (`Reconnecting`, published once per
/// attempt), so UIs can show outages and retry counts without polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No transport, nothing in flight (initial state)
    ///
    /// In this state:
    /// - No supervising task is running
    /// - `send()` fails with `NotConnected`
    /// - `connect()` is accepted
    #[default]
    Disconnected,
    /// Initial transport open in progress
    Connecting,
    /// Transport open, data flows
    ///
    /// In this state:
    /// - Received chunks are forwarded to data subscribers
    /// - Queued outbound chunks are written in order
    /// - `connect()` is rejected with `InvalidState`
    Connected,
    /// Transport failed while connected
    ///
    /// The failed transport is closed and unsent outbound chunks are
    /// discarded before reconnecting starts.
    Interrupted,
    /// Automatic reopen in progress
    Reconnecting,
}

impl ConnectionState {
    /// Check if data can be sent and received
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Check if a transport is held or being acquired
    pub fn is_active(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }

    /// Validate state transition
    ///
    /// # Returns
    ///
    /// `Ok(())` if `self -> new_state` is an edge of the state machine,
    /// `InvalidState` naming both states otherwise
    pub fn validate_transition(&self, new_state: ConnectionState) -> VbusResult<()> {
        use ConnectionState::*;

        let valid = match (*self, new_state) {
            (_, Disconnected) => true,
            (Disconnected, Connecting) => true,
            (Connecting, Connected) => true,
            (Connected, Interrupted) => true,
            (Interrupted, Reconnecting) => true,
            (Reconnecting, Reconnecting) => true,
            (Reconnecting, Connected) => true,
            _ => false,
        };

        if valid {
            Ok(())
        } else {
            Err(VbusError::InvalidState {
                operation: "transition",
                state: format!("{:?} -> {:?}", self, new_state),
            })
        }
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Interrupted => "INTERRUPTED",
            ConnectionState::Reconnecting => "RECONNECTING",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), Disconnected);
        assert!(!Disconnected.is_active());
        assert!(Reconnecting.is_active());
    }

    #[test]
    fn test_reconnect_cycle_is_valid() {
        let cycle = [Disconnected, Connecting, Connected, Interrupted, Reconnecting, Reconnecting, Connected];
        for pair in cycle.windows(2) {
            assert!(pair[0].validate_transition(pair[1]).is_ok(), "{:?}", pair);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(Connected.validate_transition(Connecting).is_err());
        assert!(Disconnected.validate_transition(Connected).is_err());
        assert!(Interrupted.validate_transition(Connected).is_err());
        for state in [Connecting, Connected, Interrupted, Reconnecting] {
            assert!(state.validate_transition(Disconnected).is_ok());
        }
    }
}
