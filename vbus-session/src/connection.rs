//! Auto-reconnecting VBus connection
//!
//! A [`Connection`] owns no transport directly. `connect()` spawns a
//! supervising task that opens the transport through the injected
//! [`TransportFactory`], pumps received chunks to data subscribers, writes
//! queued outbound chunks, and runs the reconnect cycle when the transport
//! fails:
//!
//! ```text
//! Connected -> Interrupted -> Reconnecting (-> Reconnecting ...) -> Connected
//! ```
//!
//! Every state listener has its own unbounded channel. Transitions are sent
//! to all of them while the state lock is held, so each listener observes
//! the same sequence with nothing skipped, however far behind it reads.
//!
//! Dropping the last handle stops the connection like `disconnect()`.

use crate::reconnect::ReconnectPolicy;
use crate::state::ConnectionState;
use crate::statistics::ConnectionStatistics;
use bytes::Bytes;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use vbus_core::{VbusError, VbusResult};
use vbus_transport::{ConnectionParams, StreamAccessor, TransportFactory};

/// Capacity of the received data channel
pub const DATA_CHANNEL_CAPACITY: usize = 256;

const READ_BUFFER_SIZE: usize = 1024;

struct Shared {
    state: ConnectionState,
    /// Incremented by every `connect()` and `disconnect()`; a supervising
    /// task only acts while the epoch it was started with is current.
    epoch: u64,
    listeners: Vec<mpsc::UnboundedSender<ConnectionState>>,
    outbound: Option<mpsc::UnboundedSender<Bytes>>,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    factory: Arc<dyn TransportFactory>,
    params: ConnectionParams,
    policy: ReconnectPolicy,
    shared: Mutex<Shared>,
    statistics: Mutex<ConnectionStatistics>,
    data_tx: broadcast::Sender<Bytes>,
}

/// Stops the connection once the last handle is gone
///
/// Holds only a weak reference: the supervising task keeps `Inner` alive,
/// so without this guard an abandoned connection would run forever.
struct StopOnDrop(Weak<Inner>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        if let Some(inner) = self.0.upgrade() {
            inner.stop();
        }
    }
}

/// Handle to an auto-reconnecting VBus connection
///
/// Cloning the handle is cheap; all clones control the same connection.
/// Dropping the last clone disconnects and releases the transport.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
    _guard: Arc<StopOnDrop>,
}

impl Connection {
    /// Create a disconnected connection
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        params: ConnectionParams,
        policy: ReconnectPolicy,
    ) -> Self {
        let (data_tx, _) = broadcast::channel(DATA_CHANNEL_CAPACITY);
        let inner = Arc::new(Inner {
            factory,
            params,
            policy,
            shared: Mutex::new(Shared {
                state: ConnectionState::Disconnected,
                epoch: 0,
                listeners: Vec::new(),
                outbound: None,
                task: None,
            }),
            statistics: Mutex::new(ConnectionStatistics::new()),
            data_tx,
        });
        let guard = Arc::new(StopOnDrop(Arc::downgrade(&inner)));
        Self {
            inner,
            _guard: guard,
        }
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.inner.params
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.inner.policy
    }

    /// Get a snapshot of the connection statistics
    pub fn statistics(&self) -> ConnectionStatistics {
        self.inner.statistics().clone()
    }

    /// Subscribe to state transitions
    ///
    /// The receiver sees every transition published after this call, in
    /// order. It is unbounded, so a listener that reads late still gets
    /// all of them. The channel closes once the connection is gone.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ConnectionState> {
        let mut shared = self.inner.lock();
        Inner::add_listener(&mut shared)
    }

    /// Subscribe to raw chunks received from the transport
    pub fn subscribe_data(&self) -> broadcast::Receiver<Bytes> {
        self.inner.data_tx.subscribe()
    }

    /// Open the transport and start supervising it
    ///
    /// Resolves once the first open attempt finished. On failure the
    /// connection is back in `Disconnected` and the open error is returned.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the connection is not `Disconnected`; the
    /// state is left unchanged in that case. Returns `Disconnected` if
    /// `disconnect()` aborted the attempt.
    pub async fn connect(&self) -> VbusResult<()> {
        let ready_rx = {
            let mut shared = self.inner.lock();
            if shared.state != ConnectionState::Disconnected {
                return Err(VbusError::InvalidState {
                    operation: "connect",
                    state: shared.state.to_string(),
                });
            }

            shared.epoch += 1;
            let epoch = shared.epoch;
            self.inner.publish(&mut shared, ConnectionState::Connecting);

            let (ready_tx, ready_rx) = oneshot::channel();
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            shared.outbound = Some(outbound_tx);

            let inner = Arc::clone(&self.inner);
            shared.task = Some(tokio::spawn(async move {
                inner.supervise(epoch, outbound_rx, ready_tx).await;
            }));
            ready_rx
        };

        // The sender is dropped without a result only if disconnect() aborted
        // the supervising task first.
        ready_rx.await.unwrap_or(Err(VbusError::Disconnected))
    }

    /// Stop the connection
    ///
    /// Aborts any connect or reconnect work in progress and releases the
    /// transport. Calling this on a disconnected connection does nothing.
    pub fn disconnect(&self) {
        self.inner.stop();
    }

    /// Wait until the connection is `Connected`
    ///
    /// Resolves immediately when already connected, otherwise on the next
    /// `Connected` transition, whether from `connect()` or a reconnect.
    ///
    /// # Errors
    ///
    /// Returns `Disconnected` if the connection transitions to
    /// `Disconnected` before it connects.
    pub async fn wait_connected(&self) -> VbusResult<()> {
        let mut rx = {
            let mut shared = self.inner.lock();
            if shared.state.is_connected() {
                return Ok(());
            }
            Inner::add_listener(&mut shared)
        };

        while let Some(state) = rx.recv().await {
            match state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Disconnected => return Err(VbusError::Disconnected),
                _ => {}
            }
        }
        Err(VbusError::Disconnected)
    }

    /// Queue `data` for transmission
    ///
    /// Chunks still queued when the link fails are discarded, never written
    /// to the reopened transport.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` unless the connection is `Connected`.
    pub fn send(&self, data: impl Into<Bytes>) -> VbusResult<()> {
        let shared = self.inner.lock();
        if !shared.state.is_connected() {
            return Err(VbusError::NotConnected);
        }
        match &shared.outbound {
            Some(outbound) => outbound.send(data.into()).map_err(|_| VbusError::NotConnected),
            None => Err(VbusError::NotConnected),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("path", &self.inner.params.path)
            .field("state", &self.state())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn statistics(&self) -> MutexGuard<'_, ConnectionStatistics> {
        self.statistics.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn add_listener(shared: &mut Shared) -> mpsc::UnboundedReceiver<ConnectionState> {
        let (tx, rx) = mpsc::unbounded_channel();
        shared.listeners.push(tx);
        rx
    }

    fn publish(&self, shared: &mut Shared, new_state: ConnectionState) {
        log::info!(
            "VBus connection {}: {} -> {}",
            self.params.path,
            shared.state,
            new_state
        );
        shared.state = new_state;
        if new_state == ConnectionState::Disconnected {
            shared.outbound = None;
            shared.task = None;
        }
        // Listeners whose receiver was dropped are forgotten here
        shared
            .listeners
            .retain(|listener| listener.send(new_state).is_ok());
    }

    /// Invalidate the running task, publish `Disconnected` and abort it
    fn stop(&self) {
        let task = {
            let mut shared = self.lock();
            shared.epoch += 1;
            shared.outbound = None;
            let task = shared.task.take();
            if shared.state != ConnectionState::Disconnected {
                self.publish(&mut shared, ConnectionState::Disconnected);
            }
            task
        };

        if let Some(task) = task {
            task.abort();
        }
    }

    /// Apply a transition requested by the supervising task of `epoch`
    ///
    /// Returns `false` if that task has been superseded and must stop.
    fn transition(&self, epoch: u64, new_state: ConnectionState) -> bool {
        let mut shared = self.lock();
        if shared.epoch != epoch {
            return false;
        }
        if let Err(err) = shared.state.validate_transition(new_state) {
            log::warn!("Ignoring connection state change: {}", err);
            return false;
        }
        self.publish(&mut shared, new_state);
        true
    }

    /// Open a transport and apply the idle timeout to it
    async fn open_transport(&self) -> VbusResult<Box<dyn StreamAccessor>> {
        let mut transport = self.factory.open(&self.params).await?;
        if let Err(err) = transport.set_timeout(self.params.idle_timeout()).await {
            let _ = transport.close().await;
            return Err(err);
        }
        Ok(transport)
    }

    async fn supervise(
        &self,
        epoch: u64,
        mut outbound: mpsc::UnboundedReceiver<Bytes>,
        ready: oneshot::Sender<VbusResult<()>>,
    ) {
        let mut transport = match self.open_transport().await {
            Ok(transport) => transport,
            Err(err) => {
                log::warn!("Failed to open VBus transport {}: {}", self.params.path, err);
                self.transition(epoch, ConnectionState::Disconnected);
                let _ = ready.send(Err(err));
                return;
            }
        };

        self.statistics().increment_connects();
        if !self.transition(epoch, ConnectionState::Connected) {
            let _ = transport.close().await;
            return;
        }
        let _ = ready.send(Ok(()));

        loop {
            let err = self.pump(transport.as_mut(), &mut outbound).await;
            log::warn!("VBus transport {} interrupted: {}", self.params.path, err);
            let _ = transport.close().await;

            self.statistics().increment_interruptions();
            if !self.transition(epoch, ConnectionState::Interrupted) {
                return;
            }

            // send() is rejected from here on, so this empties the queue
            let mut discarded = 0;
            while outbound.try_recv().is_ok() {
                discarded += 1;
            }
            if discarded > 0 {
                log::debug!(
                    "Discarded {} unsent chunks for {}",
                    discarded,
                    self.params.path
                );
            }

            if !self.transition(epoch, ConnectionState::Reconnecting) {
                return;
            }

            transport = match self.reopen(epoch).await {
                Some(transport) => transport,
                None => return,
            };
        }
    }

    /// Move data until the transport fails, returning the failure
    ///
    /// With an idle timeout set, a silent link fails with `Timeout`.
    async fn pump(
        &self,
        transport: &mut dyn StreamAccessor,
        outbound: &mut mpsc::UnboundedReceiver<Bytes>,
    ) -> VbusError {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            tokio::select! {
                result = transport.read(&mut buf) => match result {
                    Ok(0) => {
                        return VbusError::Connection(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "transport closed by peer",
                        ));
                    }
                    Ok(n) => {
                        self.statistics().add_bytes_received(n);
                        let _ = self.data_tx.send(Bytes::copy_from_slice(&buf[..n]));
                    }
                    Err(err) => return err,
                },
                Some(chunk) = outbound.recv() => {
                    if let Err(err) = transport.write_all(&chunk).await {
                        return err;
                    }
                    if let Err(err) = transport.flush().await {
                        return err;
                    }
                    self.statistics().add_bytes_sent(chunk.len());
                }
            }
        }
    }

    /// Reopen the transport according to the reconnect policy
    ///
    /// Returns `None` once attempts are exhausted or the task was superseded.
    async fn reopen(&self, epoch: u64) -> Option<Box<dyn StreamAccessor>> {
        let mut attempt: u32 = 1;
        loop {
            self.statistics().increment_reconnect_attempts();
            match self.open_transport().await {
                Ok(transport) => {
                    self.statistics().increment_connects();
                    if self.transition(epoch, ConnectionState::Connected) {
                        return Some(transport);
                    }
                    return None;
                }
                Err(err) => {
                    log::debug!(
                        "Reconnect attempt {} to {} failed: {}",
                        attempt,
                        self.params.path,
                        err
                    );
                    if !self.policy.allows_attempt(attempt) {
                        log::warn!(
                            "Giving up on {} after {} reconnect attempts",
                            self.params.path,
                            attempt
                        );
                        self.transition(epoch, ConnectionState::Disconnected);
                        return None;
                    }

                    attempt += 1;
                    let delay = self.policy.delay_for_attempt(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    if !self.transition(epoch, ConnectionState::Reconnecting) {
                        return None;
                    }
                }
            }
        }
    }
}
