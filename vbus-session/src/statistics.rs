//! Connection statistics collection

/// Connection statistics
///
/// Updated by the connection's supervising task, readable at any time
/// through `Connection::statistics()`.
///
/// # Why Statistics?
/// State events only say that a link failed. The counters show how often:
/// - **Link Quality**: interruptions per connect reveal flaky adapters
/// - **Reconnect Cost**: attempts per interruption show how long outages last
/// - **Throughput**: byte counters confirm that a controller keeps talking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatistics {
    /// Successful transport opens, initial and automatic
    pub connects: u64,
    /// Transport failures while connected
    pub interruptions: u64,
    /// Reopen attempts after interruptions
    pub reconnect_attempts: u64,
    /// Bytes received from the transport
    pub bytes_received: u64,
    /// Bytes written to the transport
    pub bytes_sent: u64,
}

impl ConnectionStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Increment the connects counter
    ///
    /// Counted for every successful open, including reconnects.
    pub fn increment_connects(&mut self) {
        self.connects += 1;
    }

    /// Increment the interruptions counter
    pub fn increment_interruptions(&mut self) {
        self.interruptions += 1;
    }

    /// Increment the reconnect attempts counter
    ///
    /// Counted before each reopen, whether or not it succeeds.
    pub fn increment_reconnect_attempts(&mut self) {
        self.reconnect_attempts += 1;
    }

    /// Add to the received byte counter
    ///
    /// # Arguments
    ///
    /// * `count` - Size of the chunk read from the transport
    pub fn add_bytes_received(&mut self, count: usize) {
        self.bytes_received += count as u64;
    }

    /// Add to the sent byte counter
    ///
    /// # Arguments
    ///
    /// * `count` - Size of the chunk written and flushed
    pub fn add_bytes_sent(&mut self, count: usize) {
        self.bytes_sent += count as u64;
    }
}
