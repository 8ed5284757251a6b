//! Room session handle
//!
//! One session per room visit: opening it starts the live channel, `load` performs the
//! bulk read, and closing (or dropping) it tears everything down.

use std::sync::Arc;

use ama_common::LiveConfig;
use ama_core::{EventTransport, Message, MessageId, ReactionDirection, RoomApi, RoomId, SyncError, SyncResult};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::actor::{ActorParts, Command, SessionActor};
use super::view::{ReactionReceipt, RoomView, SessionNotice};
use crate::channel::{ChannelConfig, ChannelState, LiveEventChannel};

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub channel: ChannelConfig,
    /// Heal gaps with a fresh bulk read after every reconnect
    pub resync_on_reconnect: bool,
    /// Capacity of the command, completion and notice queues
    pub buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&LiveConfig::default())
    }
}

impl From<&LiveConfig> for SessionConfig {
    fn from(config: &LiveConfig) -> Self {
        Self {
            channel: ChannelConfig::from(config),
            resync_on_reconnect: config.resync_on_reconnect,
            buffer: config.event_buffer.max(1),
        }
    }
}

/// Handle to a synchronized room
///
/// Must be created inside a tokio runtime.
pub struct RoomSession {
    room_id: RoomId,
    commands: mpsc::Sender<Command>,
    view_rx: watch::Receiver<RoomView>,
    notice_tx: broadcast::Sender<SessionNotice>,
    actor: Option<JoinHandle<()>>,
}

impl RoomSession {
    /// Enter a room: start the live channel right away
    pub fn open(
        room_id: RoomId,
        api: Arc<dyn RoomApi>,
        transport: Arc<dyn EventTransport>,
        config: SessionConfig,
    ) -> Self {
        let (channel, channel_rx) =
            LiveEventChannel::open(room_id.clone(), transport, config.channel.clone());
        let (commands_tx, commands_rx) = mpsc::channel(config.buffer);
        let (view_tx, view_rx) = watch::channel(RoomView::default());
        let (notice_tx, _) = broadcast::channel(config.buffer);

        let actor = SessionActor::new(ActorParts {
            room_id: room_id.clone(),
            api,
            resync_on_reconnect: config.resync_on_reconnect,
            buffer: config.buffer,
            channel,
            channel_rx,
            commands: commands_rx,
            view_tx,
            notice_tx: notice_tx.clone(),
        });
        let span = tracing::info_span!("room_session", room_id = %room_id);
        let actor = tokio::spawn(actor.run().instrument(span));

        Self {
            room_id,
            commands: commands_tx,
            view_rx,
            notice_tx,
            actor: Some(actor),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Perform the bulk read
    ///
    /// Returns the number of messages once the room is loaded. After a failure the
    /// live channel keeps running and `load` may simply be called again.
    pub async fn load(&self) -> SyncResult<usize> {
        self.request(|reply| Command::Load { reply }).await
    }

    /// Add or remove this client's reaction
    ///
    /// Resolves with the server-confirmed count.
    pub async fn react(
        &self,
        message_id: &MessageId,
        direction: ReactionDirection,
    ) -> SyncResult<ReactionReceipt> {
        let message_id = message_id.clone();
        self.request(|reply| Command::React {
            message_id,
            direction: Some(direction),
            reply,
        })
        .await
    }

    /// Like if not liked, unlike otherwise
    pub async fn toggle_reaction(&self, message_id: &MessageId) -> SyncResult<ReactionReceipt> {
        let message_id = message_id.clone();
        self.request(|reply| Command::React {
            message_id,
            direction: None,
            reply,
        })
        .await
    }

    /// Latest published view
    pub fn view(&self) -> RoomView {
        self.view_rx.borrow().clone()
    }

    /// Latest published messages
    pub fn snapshot(&self) -> Arc<Vec<Message>> {
        Arc::clone(&self.view_rx.borrow().messages)
    }

    /// Receiver notified on every published view
    pub fn watch(&self) -> watch::Receiver<RoomView> {
        self.view_rx.clone()
    }

    pub fn connection_state(&self) -> ChannelState {
        self.view_rx.borrow().connection
    }

    /// Subscribe to user-facing notices
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notice_tx.subscribe()
    }

    /// Leave the room and wait for teardown to finish
    pub async fn close(mut self) {
        let (reply, done) = oneshot::channel();
        if self.commands.send(Command::Close { reply }).await.is_ok() {
            let _ = done.await;
        }
        if let Some(actor) = self.actor.take() {
            let _ = actor.await;
        }
    }

    async fn request<T, F>(&self, build: F) -> SyncResult<T>
    where
        F: FnOnce(oneshot::Sender<SyncResult<T>>) -> Command,
    {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SyncError::SessionClosed)?;
        response.await.map_err(|_| SyncError::SessionClosed)?
    }
}

impl std::fmt::Debug for RoomSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSession")
            .field("room_id", &self.room_id)
            .field("connection", &self.connection_state())
            .finish()
    }
}
