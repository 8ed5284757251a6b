//! Live event channel
//!
//! Owns the push subscription of one room. A background task connects through the
//! [`EventTransport`], decodes frames into [`RoomEvent`]s and reconnects with backoff
//! after unexpected drops. Everything it learns is reported as a [`ChannelNotice`].

use std::sync::Arc;
use std::time::Duration;

use ama_common::LiveConfig;
use ama_core::{EventStream, EventTransport, RoomEvent, RoomId};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use super::backoff::ReconnectPolicy;
use super::protocol::{decode_frame, Decoded};
use super::state::ChannelState;

/// What the channel reports to its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelNotice {
    /// A decoded room event
    Event(RoomEvent),
    /// Connection state changed
    StateChanged(ChannelState),
    /// The subscription is open again after a drop; events in the gap were missed
    Reconnected { attempts: u32 },
    /// Reconnecting keeps failing; sent once per outage, retries continue
    Degraded { attempts: u32 },
}

/// Live channel settings
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub policy: ReconnectPolicy,
    /// Consecutive failed attempts before `Degraded` is reported (0 disables it)
    pub degraded_after: u32,
    /// Capacity of the notice queue
    pub buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::from(&LiveConfig::default())
    }
}

impl From<&LiveConfig> for ChannelConfig {
    fn from(config: &LiveConfig) -> Self {
        Self {
            policy: ReconnectPolicy::from(config),
            degraded_after: config.degraded_after,
            buffer: config.event_buffer.max(1),
        }
    }
}

#[derive(Debug)]
enum ChannelCommand {
    Shutdown,
}

/// Handle to a running live channel
///
/// Dropping the handle stops the background task.
pub struct LiveEventChannel {
    room_id: RoomId,
    state_rx: watch::Receiver<ChannelState>,
    control_tx: mpsc::Sender<ChannelCommand>,
    task: Option<JoinHandle<()>>,
}

impl LiveEventChannel {
    /// Start the channel for a room
    ///
    /// Returns the handle and the receiving end of the notice queue.
    pub fn open(
        room_id: RoomId,
        transport: Arc<dyn EventTransport>,
        config: ChannelConfig,
    ) -> (Self, mpsc::Receiver<ChannelNotice>) {
        let (notice_tx, notice_rx) = mpsc::channel(config.buffer);
        let (control_tx, control_rx) = mpsc::channel(4);
        let (state_tx, state_rx) = watch::channel(ChannelState::Idle);

        let worker = ChannelWorker {
            room_id: room_id.clone(),
            transport,
            config,
            notice_tx,
            state_tx,
            control_rx,
        };
        let span = tracing::info_span!("live_channel", room_id = %room_id);
        let task = tokio::spawn(worker.run().instrument(span));

        let channel = Self {
            room_id,
            state_rx,
            control_tx,
            task: Some(task),
        };
        (channel, notice_rx)
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Current connection state
    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state change
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Close the subscription and wait for the task to finish
    pub async fn close(&mut self) {
        let _ = self.control_tx.send(ChannelCommand::Shutdown).await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(room_id = %self.room_id, error = %e, "Live channel task failed");
                }
            }
        }
    }
}

impl Drop for LiveEventChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Why a connected phase ended
enum Disconnect {
    Dropped,
    Shutdown,
}

struct ChannelWorker {
    room_id: RoomId,
    transport: Arc<dyn EventTransport>,
    config: ChannelConfig,
    notice_tx: mpsc::Sender<ChannelNotice>,
    state_tx: watch::Sender<ChannelState>,
    control_rx: mpsc::Receiver<ChannelCommand>,
}

impl ChannelWorker {
    async fn run(mut self) {
        // consecutive failed attempts since the last successful open
        let mut failures: u32 = 0;
        let mut has_opened = false;
        let mut degraded_reported = false;

        loop {
            if !self.set_state(ChannelState::Connecting).await {
                break;
            }

            let connected = tokio::select! {
                result = self.transport.connect(&self.room_id) => result,
                _ = self.control_rx.recv() => break,
            };

            match connected {
                Ok(stream) => {
                    let attempts = failures + 1;
                    failures = 0;
                    degraded_reported = false;

                    if !self.set_state(ChannelState::Open).await {
                        break;
                    }
                    if has_opened {
                        info!(attempts, "Live channel reconnected");
                        if !self.notify(ChannelNotice::Reconnected { attempts }).await {
                            break;
                        }
                    } else {
                        info!("Live channel open");
                    }
                    has_opened = true;

                    match self.pump(stream).await {
                        Disconnect::Shutdown => break,
                        Disconnect::Dropped => {}
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, attempts = failures, "Live channel connect failed");

                    let threshold = self.config.degraded_after;
                    if threshold > 0 && failures >= threshold && !degraded_reported {
                        degraded_reported = true;
                        warn!(attempts = failures, "Live channel degraded");
                        if !self
                            .notify(ChannelNotice::Degraded { attempts: failures })
                            .await
                        {
                            break;
                        }
                    }
                }
            }

            // Back off before the next attempt, both after a drop and after a failure
            let delay = self.config.policy.delay(failures.max(1));
            if !self.wait(delay).await {
                break;
            }
        }

        self.shutdown();
    }

    /// Forward frames until the stream ends or shutdown is requested
    async fn pump(&mut self, mut stream: Box<dyn EventStream>) -> Disconnect {
        loop {
            tokio::select! {
                frame = stream.next_frame() => match frame {
                    Some(Ok(text)) => {
                        if !self.handle_frame(&text).await {
                            stream.close().await;
                            return Disconnect::Shutdown;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Live channel dropped");
                        return Disconnect::Dropped;
                    }
                    None => {
                        warn!("Live channel closed by server");
                        return Disconnect::Dropped;
                    }
                },
                _ = self.control_rx.recv() => {
                    stream.close().await;
                    return Disconnect::Shutdown;
                }
            }
        }
    }

    async fn handle_frame(&self, text: &str) -> bool {
        match decode_frame(text) {
            Ok(Decoded::Event(event)) => {
                debug!(event = event.name(), message_id = %event.message_id(), "Room event");
                self.notify(ChannelNotice::Event(event)).await
            }
            Ok(Decoded::Unrecognized(kind)) => {
                debug!(kind = %kind, "Ignoring unrecognized event kind");
                true
            }
            Err(e) => {
                warn!(error = %e, "Ignoring malformed frame");
                true
            }
        }
    }

    /// Sleep unless shutdown arrives first
    async fn wait(&mut self, delay: Duration) -> bool {
        if delay.is_zero() {
            // A transport that fails without awaiting would otherwise starve the runtime
            tokio::task::yield_now().await;
            return matches!(self.control_rx.try_recv(), Err(TryRecvError::Empty));
        }
        tokio::select! {
            () = tokio::time::sleep(delay) => true,
            _ = self.control_rx.recv() => false,
        }
    }

    /// Send a notice; `false` once the owner is gone
    async fn notify(&self, notice: ChannelNotice) -> bool {
        self.notice_tx.send(notice).await.is_ok()
    }

    async fn set_state(&self, next: ChannelState) -> bool {
        let current = *self.state_tx.borrow();
        if !current.can_transition(next) {
            debug!(from = %current, to = %next, "Ignoring illegal channel transition");
            return true;
        }
        if current == next {
            return true;
        }
        self.state_tx.send_replace(next);
        self.notify(ChannelNotice::StateChanged(next)).await
    }

    fn shutdown(&self) {
        self.state_tx.send_replace(ChannelState::Closed);
        // The owner may already be gone
        let _ = self
            .notice_tx
            .try_send(ChannelNotice::StateChanged(ChannelState::Closed));
        info!("Live channel closed");
    }
}
