//! Telegram exchange over a live connection

use bytes::Bytes;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use vbus_core::{LiveData, Telegram, VbusError, VbusResult};
use vbus_session::{Connection, LiveDataBuffer};

/// Decodes frames received on a [`Connection`] and sends telegrams on it
///
/// Only data received after the stream was created is decoded.
pub struct LiveDataStream {
    connection: Connection,
    data: broadcast::Receiver<Bytes>,
    buffer: LiveDataBuffer,
    decoded: VecDeque<LiveData>,
}

impl LiveDataStream {
    pub fn new(connection: Connection) -> Self {
        let data = connection.subscribe_data();
        let buffer = LiveDataBuffer::with_channel(connection.params().channel);
        Self {
            connection,
            data,
            buffer,
            decoded: VecDeque::new(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Number of malformed frames skipped so far
    pub fn rejected_count(&self) -> u64 {
        self.buffer.rejected_count()
    }

    /// Queue `telegram` for transmission
    pub fn send_telegram(&self, telegram: &Telegram) -> VbusResult<()> {
        log::debug!("Sending telegram {}", telegram);
        self.connection.send(telegram.to_live_buffer())
    }

    /// Receive the next decoded frame
    ///
    /// Returns `Ok(None)` if nothing arrived within `timeout`.
    pub async fn receive_live_data(&mut self, timeout: Duration) -> VbusResult<Option<LiveData>> {
        self.receive_until(Instant::now() + timeout).await
    }

    /// Receive the next telegram accepted by `filter`, skipping all others
    ///
    /// Returns `Ok(None)` if no matching telegram arrived within `timeout`.
    pub async fn receive_telegram_matching<F>(
        &mut self,
        filter: F,
        timeout: Duration,
    ) -> VbusResult<Option<Telegram>>
    where
        F: Fn(&Telegram) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            match self.receive_until(deadline).await? {
                Some(LiveData::Telegram(telegram)) if filter(&telegram) => {
                    return Ok(Some(telegram));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
    }

    async fn receive_until(&mut self, deadline: Instant) -> VbusResult<Option<LiveData>> {
        loop {
            if let Some(frame) = self.decoded.pop_front() {
                return Ok(Some(frame));
            }

            match tokio::time::timeout_at(deadline, self.data.recv()).await {
                Err(_) => return Ok(None),
                Ok(Ok(chunk)) => self.decoded.extend(self.buffer.push(&chunk)),
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    log::warn!("Live data stream lagged, {} chunks lost", skipped);
                    self.buffer.clear();
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(VbusError::Disconnected);
                }
            }
        }
    }
}
